// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Receives progress fractions in `[0, 1]`.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, fraction: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn on_progress(&self, fraction: f64) {
        self(fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::ProgressSink;
    use std::sync::Mutex;

    #[test]
    fn closures_act_as_progress_sinks() {
        let seen = Mutex::new(Vec::new());
        let sink = |fraction: f64| {
            seen.lock().expect("progress mutex should lock").push(fraction);
        };
        let sink: &dyn ProgressSink = &sink;
        sink.on_progress(0.25);
        sink.on_progress(0.5);
        assert_eq!(*seen.lock().expect("progress mutex should lock"), vec![0.25, 0.5]);
    }
}
