use molforce_device::{Device, Stream};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

#[test]
fn test_commands_run_in_order() {
    let device = Device::default();
    let stream = Stream::new(&device).unwrap();
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

    for i in 0..50 {
        let log = Arc::clone(&log);
        stream.enqueue(move || log.lock().push(i)).unwrap();
    }
    stream.synchronize().unwrap();

    assert_eq!(*log.lock(), (0..50).collect::<Vec<_>>());
}

#[test]
fn test_drop_drains_queue() {
    let device = Device::default();
    let counter = Arc::new(AtomicUsize::new(0));
    {
        let stream = Stream::new(&device).unwrap();
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            stream
                .enqueue(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
    }
    assert_eq!(counter.load(Ordering::SeqCst), 10);
}
