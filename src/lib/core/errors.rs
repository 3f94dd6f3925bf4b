use anyhow::Error;
use std::io;

/// Returns `true` if the error originated from a broken pipe, e.g. `biomkit unpack t.biom | head`.
#[inline]
pub fn is_broken_pipe(err: &Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|io_err| io_err.kind() == io::ErrorKind::BrokenPipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn detects_wrapped_broken_pipe() {
        let inner: Result<(), io::Error> = Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        let err = inner.context("writing triples").unwrap_err();
        assert!(is_broken_pipe(&err));
    }

    #[test]
    fn ignores_other_errors() {
        let err = anyhow::anyhow!("bad input");
        assert!(!is_broken_pipe(&err));
    }
}
