use std::{thread, time::Duration};

/// starts the one shot timeout, `on_fire` runs once the delay has passed.
/// there is no way to cancel it, a zero delay means no watchdog at all
pub fn spawn<F>(delay: Duration, on_fire: F) -> Option<thread::JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    if delay.is_zero() {
        log::info!("timeout disabled");
        return None;
    }
    log::info!("timeout in {}", crate::duration::format(delay));
    let spawned = thread::Builder::new()
        .name("timeout".to_string())
        .spawn(move || {
            thread::sleep(delay);
            on_fire();
        });
    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::error!("couldn't start timeout thread: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn zero_never_fires() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn(Duration::ZERO, move || tx.send(()).unwrap());
        assert!(handle.is_none());
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn fires_once_after_delay() {
        let (tx, rx) = mpsc::channel();
        let started = std::time::Instant::now();
        let handle = spawn(Duration::from_millis(20), move || tx.send(()).unwrap()).unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
        handle.join().unwrap();
        // the sender went away with the closure, nothing else is coming
        assert!(rx.recv().is_err());
    }
}
