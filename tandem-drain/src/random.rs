use rand::Rng;

/// Source of node values.
///
pub trait RandomSource {
    fn next_random_i32(&mut self) -> i32;
}

/// Uniform values from the thread-local generator.
///
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_random_i32(&mut self) -> i32 {
        rand::rng().random()
    }
}

// Any closure producing values is a source, which keeps test harnesses short.
//
impl<F: FnMut() -> i32> RandomSource for F {
    fn next_random_i32(&mut self) -> i32 {
        self()
    }
}
