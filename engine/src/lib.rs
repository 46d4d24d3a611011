pub mod inbox;
pub mod synth;
pub mod trace;
pub mod tween;

pub use trace::{Trace, TraceEntry, TraceError};

pub const DEFAULT_TRACE_CAPACITY: usize = 1024;

/// A synchronous machine that turns one input into at most one effect.
///
/// Implementations own their state and must be total over `Input`: every call
/// leaves the machine in a consistent state, whatever sequence came before.
pub trait Reactor {
    type Input: Copy;
    type Effect: Clone;

    fn react(&mut self, input: Self::Input) -> Option<Self::Effect>;
}

/// Steps a [`Reactor`] one input at a time and keeps a bounded trace of what
/// happened.
pub struct HeadlessRunner<R: Reactor> {
    reactor: R,
    trace: Trace<R::Input, R::Effect>,
}

impl<R: Reactor> HeadlessRunner<R> {
    pub fn new(reactor: R) -> Self {
        Self::with_trace_capacity(reactor, DEFAULT_TRACE_CAPACITY)
    }

    pub fn with_trace_capacity(reactor: R, capacity: usize) -> Self {
        Self {
            reactor,
            trace: Trace::new(capacity),
        }
    }

    pub fn frame(&self) -> u64 {
        self.trace.frame()
    }

    pub fn reactor(&self) -> &R {
        &self.reactor
    }

    pub fn trace(&self) -> &Trace<R::Input, R::Effect> {
        &self.trace
    }

    pub fn step(&mut self, input: R::Input) -> Option<R::Effect> {
        let effect = self.reactor.react(input);
        self.trace.record(input, effect.clone());
        effect
    }

    /// Feeds every input in order and returns the effects that were emitted.
    pub fn run<I>(&mut self, inputs: I) -> Vec<R::Effect>
    where
        I: IntoIterator<Item = R::Input>,
    {
        inputs
            .into_iter()
            .filter_map(|input| self.step(input))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emits the running total every time it crosses a multiple of ten.
    struct Tens {
        total: i32,
    }

    impl Reactor for Tens {
        type Input = i32;
        type Effect = i32;

        fn react(&mut self, input: i32) -> Option<i32> {
            let before = self.total / 10;
            self.total += input;
            (self.total / 10 != before).then_some(self.total)
        }
    }

    #[test]
    fn runner_steps_and_records_every_input() {
        let mut runner = HeadlessRunner::new(Tens { total: 0 });
        assert_eq!(runner.step(4), None);
        assert_eq!(runner.step(7), Some(11));
        assert_eq!(runner.frame(), 2);

        let inputs: Vec<i32> = runner.trace().entries().map(|e| e.input).collect();
        assert_eq!(inputs, vec![4, 7]);
        assert_eq!(runner.trace().effects(), vec![11]);
    }

    #[test]
    fn run_returns_only_emitted_effects() {
        let mut runner = HeadlessRunner::new(Tens { total: 0 });
        let effects = runner.run([5, 5, 1, 9, 20]);
        assert_eq!(effects, vec![10, 20, 40]);
        assert_eq!(runner.reactor().total, 40);
    }
}
