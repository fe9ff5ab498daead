//! Diagnostics for runtime calls.

use crate::perception::Perception;
use crate::types::ResultCode;

/// Log the outcome of one runtime call.
///
/// Success is logged at `info`, failure at `error` together with the code and
/// the runtime's own description of it. Never affects control flow.
pub fn record<P, T>(perception: &P, what: &str, outcome: &Result<T, ResultCode>)
where
    P: Perception + ?Sized,
{
    match outcome {
        Ok(_) => log::info!("{} OK", what),
        Err(code) => log_failure(perception, what, *code),
    }
}

/// Log a failure only. For per-query calls that would flood the log on success.
pub fn record_failure<P, T>(perception: &P, what: &str, outcome: &Result<T, ResultCode>)
where
    P: Perception + ?Sized,
{
    if let Err(code) = outcome {
        log_failure(perception, what, *code);
    }
}

pub(crate) fn log_failure<P>(perception: &P, what: &str, code: ResultCode)
where
    P: Perception + ?Sized,
{
    log::error!("{}", describe_failure(perception, what, code));
}

/// Text of a failure diagnostic: `<what> failed: r=<code> (<description>)`.
pub fn describe_failure<P>(perception: &P, what: &str, code: ResultCode) -> String
where
    P: Perception + ?Sized,
{
    format!(
        "{} failed: r={} ({})",
        what,
        code,
        perception.result_string(code)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedPerception;

    #[test]
    fn test_describe_failure_uses_runtime_description() {
        let sim = SimulatedPerception::default();
        let text = describe_failure(&sim, "PerceptionStartup", ResultCode::INVALID_PARAM);
        assert_eq!(
            text,
            "PerceptionStartup failed: r=5 (MLResult_InvalidParam)"
        );
    }

    #[test]
    fn test_record_accepts_both_outcomes() {
        let _ = env_logger::builder().is_test(true).try_init();
        let sim = SimulatedPerception::default();
        record(&sim, "HeadTrackingCreate", &Ok::<(), ResultCode>(()));
        record(&sim, "HeadTrackingCreate", &Err::<(), _>(ResultCode(42)));
        record_failure(&sim, "SnapshotGetTransformWithDerivatives", &Ok::<u8, ResultCode>(1));
    }
}
