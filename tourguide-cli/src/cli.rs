use clap::Parser;
use std::path::PathBuf;
use tourguide_core::{Category, GeoPoint};

/// Longest position wait accepted on the command line
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Browse the region's cities and heritage sites, and find the ones near you
#[derive(Parser, Debug)]
#[command(name = "tourguide")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lists cities and heritage sites and finds the ones near you", long_about = None)]
pub struct Args {
    /// Read snapshots from a JSON file instead of the realtime database
    #[arg(long = "data", value_name = "FILE", conflicts_with = "builtin")]
    pub data: Option<PathBuf>,

    /// Use the built-in city dataset
    #[arg(long = "builtin")]
    pub builtin: bool,

    /// Realtime database REST root (overrides TOURGUIDE_DATABASE_URL)
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// List cities whose name contains TERM (empty lists all)
    #[arg(short = 's', long = "search", value_name = "TERM")]
    pub search: Option<String>,

    /// Find cities near the current position
    #[arg(short = 'n', long = "near")]
    pub near: bool,

    /// Reference position for --near as "LAT,LNG" (otherwise looked up by IP)
    #[arg(long = "at", value_name = "LAT,LNG", requires = "near")]
    pub at: Option<GeoPoint>,

    /// Search radius in kilometres for --near
    #[arg(long = "radius", value_name = "KM")]
    pub radius: Option<f64>,

    /// Seconds to wait for a position (1 to 3600)
    #[arg(
        long = "timeout",
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS)
    )]
    pub timeout: Option<u64>,

    /// List the heritage places of CITY
    #[arg(long = "heritage", value_name = "CITY")]
    pub heritage: Option<String>,

    /// List a category: beach, lake, temple, wildlife, hills or popular
    #[arg(short = 'c', long = "category", value_name = "CATEGORY")]
    pub category: Option<Category>,

    /// Name for a feedback submission
    #[arg(long = "feedback-name", requires = "feedback_email")]
    pub feedback_name: Option<String>,

    /// Email for a feedback submission
    #[arg(long = "feedback-email", requires = "feedback_message")]
    pub feedback_email: Option<String>,

    /// Message for a feedback submission
    #[arg(long = "feedback-message", requires = "feedback_name")]
    pub feedback_message: Option<String>,

    /// Store feedback in this JSON-lines file instead of the database
    #[arg(long = "feedback-file", value_name = "FILE")]
    pub feedback_file: Option<PathBuf>,

    /// Ask the chat backend a question
    #[arg(long = "ask", value_name = "PROMPT")]
    pub ask: Option<String>,

    /// Print the chat backend's conversation history
    #[arg(long = "chat-history")]
    pub chat_history: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Parses command-line arguments
pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_near_at() {
        let args =
            Args::try_parse_from(["tourguide", "--builtin", "--near", "--at", "11.6643,78.1460"])
                .unwrap();
        assert!(args.near);
        assert_eq!(args.at, Some(GeoPoint::new(11.6643, 78.1460)));
    }

    #[test]
    fn test_at_requires_near() {
        assert!(Args::try_parse_from(["tourguide", "--at", "11.6643,78.1460"]).is_err());
    }

    #[test]
    fn test_bad_position_rejected() {
        assert!(Args::try_parse_from(["tourguide", "--near", "--at", "north"]).is_err());
    }

    #[test]
    fn test_feedback_needs_all_fields() {
        assert!(Args::try_parse_from(["tourguide", "--feedback-name", "A"]).is_err());
        assert!(Args::try_parse_from([
            "tourguide",
            "--feedback-name",
            "A",
            "--feedback-email",
            "a@b.co",
            "--feedback-message",
            "hi",
        ])
        .is_ok());
    }

    #[test]
    fn test_parse_category() {
        let args = Args::try_parse_from(["tourguide", "--category", "wildlife"]).unwrap();
        assert_eq!(args.category, Some(Category::Wildlife));

        assert!(Args::try_parse_from(["tourguide", "-c", "volcanoes"]).is_err());
    }

    #[test]
    fn test_timeout_is_bounded() {
        let args = Args::try_parse_from(["tourguide", "--near", "--timeout", "30"]).unwrap();
        assert_eq!(args.timeout, Some(30));

        assert!(Args::try_parse_from(["tourguide", "--near", "--timeout", "0"]).is_err());
        assert!(
            Args::try_parse_from(["tourguide", "--near", "--timeout", "18446744073709551615"])
                .is_err()
        );
    }

    #[test]
    fn test_data_conflicts_with_builtin() {
        assert!(Args::try_parse_from(["tourguide", "--builtin", "--data", "db.json"]).is_err());
    }
}
