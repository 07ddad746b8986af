//! Tiny hand-rolled `--flag value` parser shared by the three binaries.
//!
//! Flag parsing for the three binaries is small and uniform enough that a
//! `clap` dependency would outweigh its benefit here — one shared helper
//! instead of three copies.

/// Returns the value following `key` in `args`, if present.
pub fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

pub fn parse_u64_flag(args: &[String], key: &str, default: u64) -> u64 {
    parse_flag(args, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn parse_usize_flag(args: &[String], key: &str, default: usize) -> usize {
    parse_flag(args, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn parse_string_flag(args: &[String], key: &str, default: &str) -> String {
    parse_flag(args, key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_present_and_missing_flags() {
        let args: Vec<String> = ["--port", "8030", "--workers", "workers.txt"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(parse_u64_flag(&args, "--port", 0), 8030);
        assert_eq!(parse_string_flag(&args, "--workers", "x"), "workers.txt");
        assert_eq!(parse_usize_flag(&args, "--threads", 4), 4);
    }
}
