use std::{fmt, io};

/// Writes `items` on one line, separated by `separator`.
pub(crate) fn write_joined<W, T>(sink: &mut W, items: &[T], separator: &str) -> io::Result<()>
where
    W: io::Write + ?Sized,
    T: fmt::Display,
{
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            sink.write_all(separator.as_bytes())?;
        }
        write!(sink, "{item}")?;
    }
    writeln!(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_joined() {
        let mut out = Vec::new();
        write_joined(&mut out, &[1, 2, 3], ", ").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1, 2, 3\n");
    }

    #[test]
    fn test_write_joined_single() {
        let mut out = Vec::new();
        write_joined(&mut out, &[2.5], ",").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2.5\n");
    }
}
