//! Single decision point for recoverable errors.

use log::{debug, error, warn};

use crate::ErrorPolicy;
use crate::error::SampleError;

use super::context::RunContext;

/// Apply `policy` to `err`. Returns `Err` only under [`ErrorPolicy::Raise`]; otherwise the
/// error is counted, optionally logged, and the caller continues with sibling work.
pub fn dispose(policy: ErrorPolicy, ctx: &RunContext, err: SampleError) -> Result<(), SampleError> {
    if matches!(err, SampleError::Cancelled) {
        return Err(err);
    }
    match policy {
        ErrorPolicy::Skip => {
            ctx.record_error();
            debug!("skipped ({}): {}", err.kind(), err);
            Ok(())
        }
        ErrorPolicy::Warn => {
            ctx.record_error();
            warn!("{}", err);
            Ok(())
        }
        ErrorPolicy::Raise => {
            error!("{}: {}", err.kind(), err);
            Err(err)
        }
    }
}

/// Run `f` and route a failure through the policy.
pub fn guarded<F>(policy: ErrorPolicy, ctx: &RunContext, f: F) -> Result<(), SampleError>
where
    F: FnOnce() -> Result<(), SampleError>,
{
    match f() {
        Ok(()) => Ok(()),
        Err(err) => dispose(policy, ctx, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corrupt() -> SampleError {
        SampleError::corrupt_archive("bad.zip", "invalid central directory")
    }

    #[test]
    fn skip_and_warn_continue() {
        let ctx = RunContext::new(None);
        assert!(dispose(ErrorPolicy::Skip, &ctx, corrupt()).is_ok());
        assert!(dispose(ErrorPolicy::Warn, &ctx, corrupt()).is_ok());
        assert_eq!(ctx.errors(), 2);
    }

    #[test]
    fn raise_propagates_and_names_unit() {
        let ctx = RunContext::new(None);
        let err = dispose(ErrorPolicy::Raise, &ctx, corrupt()).unwrap_err();
        assert!(err.to_string().contains("bad.zip"));
        assert_eq!(ctx.errors(), 0);
    }

    #[test]
    fn cancellation_is_never_swallowed() {
        let ctx = RunContext::new(None);
        assert!(dispose(ErrorPolicy::Skip, &ctx, SampleError::Cancelled).is_err());
    }

    #[test]
    fn guarded_passes_success_through() {
        let ctx = RunContext::new(None);
        assert!(guarded(ErrorPolicy::Raise, &ctx, || Ok(())).is_ok());
        assert!(guarded(ErrorPolicy::Warn, &ctx, || Err(corrupt())).is_ok());
    }
}
