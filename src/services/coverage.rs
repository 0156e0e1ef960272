use serde::Serialize;
use std::collections::HashMap;

use crate::{
    lists::UniqueMovieList,
    models::{Movie, Role},
};

/// How often a contributor appears among reviewed movies, and whether the
/// unique list already credits them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorCoverage {
    pub uri: String,
    /// Number of reviewed movies crediting this contributor in any role
    pub film_count: usize,
    /// Unique-list movie already crediting them, if any
    pub covered_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    pub movies_examined: usize,
    /// Most frequent first; ties by URI
    pub contributors: Vec<ContributorCoverage>,
}

impl CoverageReport {
    /// Frequent contributors the unique list does not credit yet
    pub fn uncovered(&self) -> impl Iterator<Item = &ContributorCoverage> + '_ {
        self.contributors.iter().filter(|c| c.covered_by.is_none())
    }
}

/// Counts contributors across `reviewed` and checks each against `unique`
pub fn build_report(reviewed: &[Movie], unique: &UniqueMovieList) -> CoverageReport {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for movie in reviewed {
        let mut seen_in_movie: Vec<&str> = Vec::new();
        for (_, contributor) in movie.contributors() {
            if !seen_in_movie.contains(&contributor) {
                seen_in_movie.push(contributor);
                *counts.entry(contributor).or_insert(0) += 1;
            }
        }
    }

    let mut contributors: Vec<ContributorCoverage> = counts
        .into_iter()
        .map(|(uri, film_count)| ContributorCoverage {
            uri: uri.to_string(),
            film_count,
            covered_by: Role::ALL
                .into_iter()
                .find_map(|role| unique.movie_for_contributor(role, uri))
                .map(|movie| movie.uri.clone()),
        })
        .collect();

    contributors.sort_by(|a, b| b.film_count.cmp(&a.film_count).then_with(|| a.uri.cmp(&b.uri)));

    CoverageReport {
        movies_examined: reviewed.len(),
        contributors,
    }
}
