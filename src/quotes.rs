//! Motivational quote selection
//!
//! Picks a quote uniformly at random, optionally restricted to quotes whose
//! text contains a case-insensitive search string.

use crate::Result;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

const MOTIVATIONAL: &str = include_str!("../data/quotes/motivational.json");
const FEATURED: &str = include_str!("../data/quotes/featured.json");

pub const NO_RESULTS: &str = "No quotes found for your search.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.text)?;
        if let Some(author) = &self.author {
            write!(f, " - {}", author)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum QuoteSelection<'a> {
    Found(&'a Quote),
    NoResults,
}

impl fmt::Display for QuoteSelection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteSelection::Found(quote) => write!(f, "{}", quote),
            QuoteSelection::NoResults => f.write_str(NO_RESULTS),
        }
    }
}

/// An ordered, immutable list of quotes.
#[derive(Debug, Clone)]
pub struct QuoteBook {
    quotes: Vec<Quote>,
}

impl QuoteBook {
    pub fn new(quotes: Vec<Quote>) -> Self {
        Self { quotes }
    }

    /// The built-in list of motivational phrases.
    pub fn motivational() -> Result<Self> {
        Ok(Self::new(serde_json::from_str(MOTIVATIONAL)?))
    }

    /// The built-in list of attributed quotes.
    pub fn featured() -> Result<Self> {
        Ok(Self::new(serde_json::from_str(FEATURED)?))
    }

    /// Read a JSON array of `{ "text", "author"? }` objects.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(&fs::read_to_string(path)?)?))
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// Quotes whose text contains `search`, ignoring case, in list order.
    pub fn matching(&self, search: &str) -> Vec<&Quote> {
        let needle = search.to_lowercase();
        self.quotes
            .iter()
            .filter(|q| q.text.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn pick<R: Rng + ?Sized>(&self, search: &str, rng: &mut R) -> QuoteSelection<'_> {
        match self.matching(search).choose(rng).copied() {
            Some(quote) => QuoteSelection::Found(quote),
            None => QuoteSelection::NoResults,
        }
    }

    pub fn pick_random(&self, search: &str) -> QuoteSelection<'_> {
        self.pick(search, &mut thread_rng())
    }
}
