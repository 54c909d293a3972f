//! CLI module - Command-line interface for PocketNavi
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Args, Parser, Subcommand};

use crate::models::{Lang, SearchType};

/// PocketNavi - Building and architect catalogue search
#[derive(Parser)]
#[command(name = "pocketnavi")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Paging and output options shared by the search commands.
#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u64,
    /// Results per page
    #[arg(long)]
    pub limit: Option<u64>,
    /// Display language (ja or en)
    #[arg(long, default_value = "ja")]
    pub lang: Lang,
    /// Print the raw result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Keyword and facet search
    #[command(alias = "s")]
    Search {
        /// Keywords; every keyword must match
        query: Vec<String>,
        /// Prefecture (Japanese or English), repeatable
        #[arg(long = "prefecture", short = 'p')]
        prefectures: Vec<String>,
        /// Completion year, repeatable
        #[arg(long = "year")]
        years: Vec<String>,
        /// Building type, repeatable
        #[arg(long = "type")]
        types: Vec<String>,
        /// Only buildings with photos
        #[arg(long)]
        photos: bool,
        /// Only buildings with videos
        #[arg(long)]
        videos: bool,
        /// Session identifier recorded in the search log
        #[arg(long)]
        session: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Buildings within a radius of a point, nearest first
    Near {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        /// Radius in kilometres
        #[arg(long, short = 'r')]
        radius: Option<f64>,
        #[arg(long)]
        photos: bool,
        #[arg(long)]
        videos: bool,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Buildings credited to an architect
    #[command(alias = "a")]
    Architect {
        slug: String,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show a single building
    #[command(alias = "b")]
    Building {
        slug: String,
        #[arg(long, default_value = "ja")]
        lang: Lang,
        #[arg(long)]
        json: bool,
    },

    /// Most searched queries
    Popular {
        #[arg(long, default_value = "1")]
        page: u64,
        #[arg(long)]
        limit: Option<u64>,
        /// Only queries containing this text
        #[arg(long, short = 'q')]
        query: Option<String>,
        /// Only queries of this type
        #[arg(long = "type")]
        search_type: Option<SearchType>,
        #[arg(long)]
        json: bool,
    },

    /// Manage the result and popular-search caches
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Import architects and buildings from a JSON dataset
    Import {
        /// Path to the dataset file
        path: String,
    },

    /// Remove search-log entries older than the given number of days
    Prune {
        #[arg(long, default_value = "90")]
        days: i64,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Remove every cached result and the popular-search cache
    Clear,
    /// Show cache statistics
    #[command(alias = "status")]
    Stats {
        #[arg(long)]
        json: bool,
    },
}

pub use commands::*;
