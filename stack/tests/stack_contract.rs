use std::cell::RefCell;
use std::rc::Rc;

use dynstack::logging::{self, BufferEvent, BufferLogger, LoggerBatch};
use dynstack::{dynstack, DynamicStack, StackError};

/// Records every buffer event on this thread until the returned handle's logger is
/// unregistered.
fn record_buffer_events() -> Rc<RefCell<Vec<BufferEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    logging::register(BufferLogger::with_capacity(8, move |batch: LoggerBatch<'_, BufferEvent>| {
        if let LoggerBatch::Logs(records) = batch {
            sink.borrow_mut().extend(records.iter().map(|(_, event)| *event));
        }
    }));
    events
}

fn finish_recording(events: &Rc<RefCell<Vec<BufferEvent>>>) -> (usize, usize) {
    drop(logging::unregister());
    let events = events.borrow();
    let allocations = events.iter().filter(|e| matches!(e, BufferEvent::Allocate(_))).count();
    let releases = events.iter().filter(|e| matches!(e, BufferEvent::Release(_))).count();
    (allocations, releases)
}

#[test]
fn pushes_are_recovered_in_order() {
    for count in [0usize, 1, 2, 3, 17, 1000] {
        let mut stack = DynamicStack::new();
        for value in 0..count {
            stack.push(value);
        }
        assert_eq!(stack.len(), count);
        assert!(stack.capacity() >= count);
        assert!(stack.iter().copied().eq(0..count));
    }
}

#[test]
fn pop_shrinks_length_only() {
    let mut stack: DynamicStack<u8> = (0..10).collect();
    let capacity = stack.capacity();
    for expected in (0..10).rev() {
        let before = stack.len();
        assert_eq!(stack.pop(), Ok(expected));
        assert_eq!(stack.len(), before - 1);
        assert_eq!(stack.capacity(), capacity);
    }
    assert_eq!(stack.pop(), Err(StackError::Empty { operation: "pop" }));
}

#[test]
fn front_is_top_and_back_is_pop() {
    let mut stack = dynstack![5, 1, 6];
    assert_eq!(stack.top(), Ok(&5));
    stack.push(10);
    assert_eq!(stack.top(), Ok(&5));
    assert_eq!(stack.pop(), Ok(10));
    assert_eq!(stack.as_slice(), &[5, 1, 6]);
}

#[test]
fn copies_are_independent() {
    let original = dynstack![vec![1], vec![2]];
    let mut copy = original.clone();
    assert_eq!(copy.len(), original.len());
    assert_eq!(copy, original);
    assert_ne!(copy.as_ptr(), original.as_ptr());

    for item in copy.iter_mut() {
        item.push(0);
    }
    assert_eq!(original.as_slice(), &[vec![1], vec![2]]);
    assert_eq!(copy.as_slice(), &[vec![1, 0], vec![2, 0]]);
}

#[test]
fn move_leaves_source_empty() {
    let mut source = dynstack![1, 2, 3];
    let destination = source.take();
    assert_eq!(destination.as_slice(), &[1, 2, 3]);
    assert_eq!(source.len(), 0);
    assert_eq!(source.capacity(), 0);

    let mut assigned = dynstack![7];
    let mut donor = destination;
    assigned.take_from(&mut donor);
    assert_eq!(assigned.as_slice(), &[1, 2, 3]);
    assert_eq!((donor.len(), donor.capacity()), (0, 0));
}

#[test]
fn double_swap_restores() {
    let mut a = dynstack!["a", "b"];
    let mut b = DynamicStack::new();
    let (a_ptr, b_ptr) = (a.as_ptr(), b.as_ptr());
    a.swap(&mut b);
    assert!(a.is_empty());
    assert_eq!(b.as_slice(), &["a", "b"]);
    a.swap(&mut b);
    assert_eq!(a.as_slice(), &["a", "b"]);
    assert!(b.is_empty());
    assert_eq!((a.as_ptr(), b.as_ptr()), (a_ptr, b_ptr));
}

#[test]
fn rendering() {
    assert_eq!(dynstack![5, 1, 6].to_string(), "[ 5, 1, 6 ]");
    assert_eq!(DynamicStack::<i32>::new().to_string(), "[  ]");
    assert_eq!(dynstack![1.5, -2.0].to_string(), "[ 1.5, -2 ]");
}

#[test]
fn resize_truncates_or_preserves() {
    let mut stack = dynstack![1, 2, 3, 4];
    stack.resize(6, 0);
    assert_eq!(stack.as_slice(), &[1, 2, 3, 4, 0, 0]);
    stack.resize(3, 0);
    assert_eq!(stack.as_slice(), &[1, 2, 3]);
}

#[test]
fn allocations_are_released_exactly_once() {
    let events = record_buffer_events();
    {
        let mut stack = DynamicStack::new();
        for value in 0..50u64 {
            stack.push(value);
        }
        while stack.len() > 10 {
            let _ = stack.pop();
        }
        stack.emplace(99);
        let mut copy = stack.clone();
        copy.assign(&[1, 2, 3]);
        copy.clone_from(&stack);
        stack.resize(2, 0);
        let mut other = copy.take();
        other.swap(&mut stack);
        copy.take_from(&mut other);
        let _: Vec<u64> = stack.into_iter().collect();
        let _ = DynamicStack::<u64>::with_len(4);
    }
    let (allocations, releases) = finish_recording(&events);
    if cfg!(feature = "logging") {
        assert!(allocations > 0);
    }
    assert_eq!(allocations, releases);
}

#[cfg(feature = "logging")]
#[test]
fn growth_allocates_twice_the_new_length() {
    let events = record_buffer_events();
    let mut stack = DynamicStack::new();
    for value in 0..7u32 {
        stack.push(value);
    }
    drop(stack);
    drop(logging::unregister());

    let capacities: Vec<usize> = events
        .borrow()
        .iter()
        .filter_map(|event| match event {
            BufferEvent::Allocate(allocate) => Some(allocate.capacity),
            BufferEvent::Release(_) => None,
        })
        .collect();
    assert_eq!(capacities, vec![2, 6, 14]);
}

#[test]
fn logger_action_may_use_stacks() {
    let recorded = Rc::new(RefCell::new(DynamicStack::<BufferEvent>::new()));
    let sink = Rc::clone(&recorded);
    logging::register(BufferLogger::with_capacity(1, move |batch: LoggerBatch<'_, BufferEvent>| {
        if let LoggerBatch::Logs(records) = batch {
            let mut sink = sink.borrow_mut();
            for (_, event) in records {
                sink.push(*event);
            }
        }
    }));
    {
        let mut stack = DynamicStack::new();
        for value in 0..3u8 {
            stack.push(value);
        }
    }
    drop(logging::unregister());

    let recorded = recorded.borrow();
    let allocations = recorded.iter().filter(|e| matches!(e, BufferEvent::Allocate(_))).count();
    let releases = recorded.iter().filter(|e| matches!(e, BufferEvent::Release(_))).count();
    assert_eq!(allocations, releases);
    if cfg!(feature = "logging") {
        assert_eq!(allocations, 2);
    }
}

#[test]
fn serde_preserves_order() {
    let stack = dynstack![String::from("first"), String::from("second")];
    let bytes = bincode::serialize(&stack).expect("serialize");
    let restored: DynamicStack<String> = bincode::deserialize(&bytes).expect("deserialize");
    assert_eq!(restored, stack);
    assert_eq!(restored.top().map(String::as_str), Ok("first"));

    let as_vec: Vec<String> = bincode::deserialize(&bytes).expect("deserialize as vec");
    assert_eq!(as_vec, vec!["first", "second"]);
}

#[test]
fn stacks_cross_threads() {
    let stack = dynstack![1u32, 2, 3];
    let sum = std::thread::spawn(move || stack.iter().sum::<u32>())
        .join()
        .expect("thread panicked");
    assert_eq!(sum, 6);
}
