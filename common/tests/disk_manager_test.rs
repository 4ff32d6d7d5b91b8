use common::api::PAGE_SIZE;
use common::disk_manager::DiskManager;

#[test]
fn test_disk_manager_read_write() {
    let dir = tempfile::tempdir().unwrap();
    let disk_manager = DiskManager::new(dir.path().join("test.db")).unwrap();

    let mut data = [0u8; PAGE_SIZE];
    for i in 0..PAGE_SIZE {
        data[i] = i as u8;
    }

    disk_manager.write_page(3, &data).unwrap();

    let mut read_data = [0u8; PAGE_SIZE];
    disk_manager.read_page(3, &mut read_data).unwrap();

    assert_eq!(data, read_data);
}

#[test]
fn test_disk_manager_unwritten_page_reads_zeroes() {
    let dir = tempfile::tempdir().unwrap();
    let disk_manager = DiskManager::new(dir.path().join("test.db")).unwrap();

    // Page 7 has never been written; the file is shorter than its offset.
    let mut read_data = [0xffu8; PAGE_SIZE];
    disk_manager.read_page(7, &mut read_data).unwrap();

    assert_eq!(read_data, [0u8; PAGE_SIZE]);
}

#[test]
fn test_disk_manager_partial_tail_zero_filled() {
    let dir = tempfile::tempdir().unwrap();
    let disk_manager = DiskManager::new(dir.path().join("test.db")).unwrap();

    // Write page 0 only; page 1 is past the end of the file.
    disk_manager.write_page(0, &[0xabu8; PAGE_SIZE]).unwrap();

    let mut read_data = [0xffu8; PAGE_SIZE];
    disk_manager.read_page(1, &mut read_data).unwrap();
    assert_eq!(read_data, [0u8; PAGE_SIZE]);

    disk_manager.read_page(0, &mut read_data).unwrap();
    assert_eq!(read_data, [0xabu8; PAGE_SIZE]);
}
