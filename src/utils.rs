use tracing_subscriber::{EnvFilter, fmt};

#[macro_export]
macro_rules! dlog {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*);
    };
}

/// Initialize colorful logging.
///
/// Default level is INFO.
/// - `-v` => DEBUG
/// - `-vv` => TRACE
/// - `-q` => WARN
/// - `-qq` => ERROR
///
/// `RUST_LOG` overrides everything (e.g. `RUST_LOG=trace`).
pub fn init_logging(verbose: u8, quiet: u8) {
    let level = level_for(verbose, quiet);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,mapty={level}")));

    let show_src = matches!(level, "debug" | "trace");

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_file(show_src)
        .with_line_number(show_src)
        .compact()
        .init();
}

fn level_for(verbose: u8, quiet: u8) -> &'static str {
    let net = i16::from(verbose) - i16::from(quiet);
    match net {
        i16::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        2..=i16::MAX => "trace",
    }
}

/// Reads a form field the way a numeric text input coerces: surrounding
/// whitespace is ignored and anything unparsable (including empty) is NaN.
pub fn parse_number(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(f64::NAN)
}

/// Derived metrics are shown with one decimal.
pub fn format_metric(value: f64) -> String {
    format!("{value:.1}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_nets_out() {
        assert_eq!(level_for(0, 0), "info");
        assert_eq!(level_for(1, 0), "debug");
        assert_eq!(level_for(5, 0), "trace");
        assert_eq!(level_for(0, 1), "warn");
        assert_eq!(level_for(1, 3), "error");
    }

    #[test]
    fn parse_number_coerces_like_a_form() {
        assert!((parse_number(" 5.3 ") - 5.3).abs() < f64::EPSILON);
        assert!(parse_number("").is_nan());
        assert!(parse_number("abc").is_nan());
        assert!((parse_number("-1") + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn metrics_round_to_one_decimal() {
        assert_eq!(format_metric(24.0 / 5.3), "4.5");
        assert_eq!(format_metric(25.0 / (95.0 / 60.0)), "15.8");
        assert_eq!(format_metric(3.0), "3.0");
    }
}
