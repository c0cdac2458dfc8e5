use tokio::task::JoinHandle;

/// A spawned task and the turn serial it was armed for.
#[derive(Debug)]
struct ArmedTask {
    serial: u64,
    handle: JoinHandle<()>,
}

/// Background tasks tied to one session: the turn countdown and the
/// automatic advance out of RESOLVE. Both are aborted when replaced,
/// cancelled, or when the session is dropped.
#[derive(Debug, Default)]
pub struct TurnTimers {
    countdown: Option<ArmedTask>,
    auto_advance: Option<ArmedTask>,
}

impl TurnTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm_countdown(&mut self, serial: u64, handle: JoinHandle<()>) {
        abort(self.countdown.replace(ArmedTask { serial, handle }));
    }

    pub fn cancel_countdown(&mut self) {
        abort(self.countdown.take());
    }

    /// Forget the countdown handle without aborting it. Called by the
    /// countdown task itself once it has fired; a task armed for an older
    /// turn leaves the current handle alone.
    pub fn release_countdown(&mut self, serial: u64) {
        release(&mut self.countdown, serial);
    }

    pub fn is_counting_down(&self) -> bool {
        is_running(&self.countdown)
    }

    pub fn arm_auto_advance(&mut self, serial: u64, handle: JoinHandle<()>) {
        abort(self.auto_advance.replace(ArmedTask { serial, handle }));
    }

    pub fn cancel_auto_advance(&mut self) {
        abort(self.auto_advance.take());
    }

    pub fn release_auto_advance(&mut self, serial: u64) {
        release(&mut self.auto_advance, serial);
    }

    pub fn is_auto_advancing(&self) -> bool {
        is_running(&self.auto_advance)
    }

    pub fn cancel_all(&mut self) {
        self.cancel_countdown();
        self.cancel_auto_advance();
    }
}

impl Drop for TurnTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn abort(task: Option<ArmedTask>) {
    if let Some(task) = task {
        task.handle.abort();
    }
}

fn release(slot: &mut Option<ArmedTask>, serial: u64) {
    if slot.as_ref().is_some_and(|task| task.serial == serial) {
        *slot = None;
    }
}

fn is_running(slot: &Option<ArmedTask>) -> bool {
    slot.as_ref().is_some_and(|task| !task.handle.is_finished())
}
