// CLI module for argument parsing and configuration

use crate::config::{ReviewConfig, UserConfig};
use crate::domain::Size;
use crate::error::Result;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Pswp - swipe through your photos, keep what you love, bin the rest
///
/// Right keeps a photo, left marks it for deletion; marked photos go to the
/// system trash together when you confirm.
#[derive(Parser, Debug, Clone)]
#[command(name = "pswp")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Photo directory to review
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Dry run mode - mark and "delete" photos without touching any file
    #[arg(short = 'n', long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Skip the confirmation dialog before deleting marked photos
    #[arg(short = 'y', long = "yes", action = ArgAction::SetTrue)]
    pub skip_confirm: bool,

    /// Photos requested from the library per fetch cycle
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,

    /// Fetch more photos once this many or fewer are left to review
    #[arg(long = "threshold")]
    pub refetch_threshold: Option<usize>,

    /// Width photos are decoded at, in pixels
    #[arg(long = "width")]
    pub width: Option<u32>,

    /// Height photos are decoded at, in pixels
    #[arg(long = "height")]
    pub height: Option<u32>,

    /// Photos decoded in parallel
    #[arg(long = "concurrency")]
    pub decode_concurrency: Option<usize>,

    /// Show the key help on start even if it was seen before
    #[arg(long = "welcome", action = ArgAction::SetTrue)]
    pub show_welcome: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> std::result::Result<(), String> {
        // Photo ids are the file paths, so they must survive a round-trip through str
        if self.directory.to_str().is_none() {
            return Err(format!(
                "Directory path must be valid UTF-8: {}",
                self.directory.display()
            ));
        }

        if !self.directory.exists() {
            return Err(format!(
                "Directory does not exist: {}",
                self.directory.display()
            ));
        }

        if !self.directory.is_dir() {
            return Err(format!(
                "Path is not a directory: {}",
                self.directory.display()
            ));
        }

        if self.page_size == Some(0) {
            return Err("page-size must be greater than zero".to_string());
        }
        if self.decode_concurrency == Some(0) {
            return Err("concurrency must be greater than zero".to_string());
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err("width and height must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Layers command line values over the persisted preferences
    pub fn apply_to(&self, user: &UserConfig) -> UserConfig {
        let mut merged = user.clone();
        if let Some(page_size) = self.page_size {
            merged.page_size = page_size;
        }
        if let Some(threshold) = self.refetch_threshold {
            merged.refetch_threshold = threshold;
        }
        if let Some(concurrency) = self.decode_concurrency {
            merged.decode_concurrency = concurrency;
        }
        merged.target_size = Size::new(
            self.width.unwrap_or(user.target_size.width),
            self.height.unwrap_or(user.target_size.height),
        );
        merged
    }
}

/// Configuration derived from CLI arguments and the config file
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directory: PathBuf,
    pub dry_run: bool,
    pub skip_confirm: bool,
    pub show_welcome: bool,
    pub review: ReviewConfig,
}

impl AppConfig {
    pub fn resolve(args: &Args, user: &UserConfig) -> Result<Self> {
        let review = args.apply_to(user).review_config()?;
        Ok(AppConfig {
            directory: args.directory.clone(),
            dry_run: args.dry_run,
            skip_confirm: args.skip_confirm,
            show_welcome: args.show_welcome || !user.welcome_shown,
            review,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            directory: PathBuf::from("."),
            dry_run: false,
            skip_confirm: false,
            show_welcome: false,
            review: ReviewConfig::default(),
        }
    }
}
