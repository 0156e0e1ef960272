use serde::Serialize;
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{Conflict, Movie, Role},
};

/// Result of a successful [`UniqueMovieList::add`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddOutcome {
    /// The movie was added without touching other entries
    Inserted,
    /// A forced add of a record matching the stored one, credit order aside
    Unchanged,
    /// Blocking entries were evicted before the movie was added
    Replaced { evicted: Vec<String> },
}

/// A movie list in which no director, writer, or actor is credited on more
/// than one entry.
///
/// Uniqueness is checked per role: a contributor indexed as a director only
/// blocks other movies that credit them as a director.
///
/// Every mutation keeps the three contributor indexes in step with the
/// entries. Failed operations leave the list untouched.
#[derive(Debug, Clone, Default)]
pub struct UniqueMovieList {
    entries: HashMap<String, Movie>,
    /// Entry URIs in insertion order
    order: Vec<String>,
    directors: HashMap<String, String>,
    writers: HashMap<String, String>,
    actors: HashMap<String, String>,
}

impl UniqueMovieList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a list from persisted records, deriving every index.
    ///
    /// Records that conflict with each other are a corrupt snapshot, never
    /// silently dropped.
    pub fn from_snapshot(list_name: &str, movies: Vec<Movie>) -> AppResult<Self> {
        let mut list = Self::new();
        for movie in movies {
            let uri = movie.uri.clone();
            list.add(movie, false)
                .map_err(|e| AppError::CorruptSnapshot {
                    list: list_name.to_string(),
                    reason: format!("entry {} cannot be restored: {}", uri, e),
                })?;
        }
        Ok(list)
    }

    /// Parses a serialized snapshot (a JSON array of movies) and rebuilds it
    pub fn from_json(list_name: &str, json: &str) -> AppResult<Self> {
        let movies: Vec<Movie> =
            serde_json::from_str(json).map_err(|e| AppError::CorruptSnapshot {
                list: list_name.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_snapshot(list_name, movies)
    }

    /// Records in insertion order; indexes are derived and never persisted
    pub fn to_snapshot(&self) -> Vec<Movie> {
        self.movies().cloned().collect()
    }

    fn index(&self, role: Role) -> &HashMap<String, String> {
        match role {
            Role::Director => &self.directors,
            Role::Writer => &self.writers,
            Role::Actor => &self.actors,
        }
    }

    fn index_mut(&mut self, role: Role) -> &mut HashMap<String, String> {
        match role {
            Role::Director => &mut self.directors,
            Role::Writer => &mut self.writers,
            Role::Actor => &mut self.actors,
        }
    }

    /// True iff none of the movie's contributors is already credited in the
    /// same role on a listed movie
    pub fn can_add(&self, movie: &Movie) -> bool {
        movie
            .contributors()
            .all(|(role, contributor)| !self.index(role).contains_key(contributor))
    }

    /// Every contributor of `movie` already claimed by a listed movie.
    ///
    /// Directors come first, then writers, then actors, each in the order the
    /// movie credits them.
    pub fn find_conflicts(&self, movie: &Movie) -> Vec<Conflict> {
        movie
            .contributors()
            .filter_map(|(role, contributor)| {
                self.index(role)
                    .get(contributor)
                    .map(|blocking_movie| Conflict {
                        role,
                        contributor: contributor.to_string(),
                        blocking_movie: blocking_movie.clone(),
                    })
            })
            .collect()
    }

    /// Contributors of `movie` that no listed movie credits yet in that role
    pub fn unused_contributors<'a>(&self, movie: &'a Movie) -> Vec<(Role, &'a str)> {
        movie
            .contributors()
            .filter(|(role, contributor)| !self.index(*role).contains_key(*contributor))
            .collect()
    }

    /// Adds a movie to the list.
    ///
    /// Without `force_replace`, any conflict (or the URI already being listed)
    /// returns [`AppError::ConstraintViolation`] carrying every conflict and
    /// nothing changes. With `force_replace`, every blocking movie is evicted
    /// first, the movie's own earlier entry included.
    pub fn add(&mut self, movie: Movie, force_replace: bool) -> AppResult<AddOutcome> {
        if force_replace
            && self
                .entries
                .get(&movie.uri)
                .is_some_and(|listed| listed.same_record(&movie))
        {
            return Ok(AddOutcome::Unchanged);
        }

        if self.can_add(&movie) && !self.has_movie(&movie.uri) {
            self.insert_unchecked(movie);
            return Ok(AddOutcome::Inserted);
        }

        // Recomputed here, after any earlier mutation
        let conflicts = self.find_conflicts(&movie);

        if !force_replace {
            return Err(AppError::ConstraintViolation {
                uri: movie.uri,
                conflicts,
            });
        }

        let mut evicted: Vec<String> = Vec::new();
        for conflict in conflicts {
            if !evicted.contains(&conflict.blocking_movie) {
                evicted.push(conflict.blocking_movie);
            }
        }
        if self.has_movie(&movie.uri) && !evicted.contains(&movie.uri) {
            evicted.push(movie.uri.clone());
        }

        for uri in &evicted {
            self.detach(uri);
        }

        debug_assert!(self.can_add(&movie));
        self.insert_unchecked(movie);

        Ok(AddOutcome::Replaced { evicted })
    }

    /// Removes a movie and unwinds its contributors from every index
    pub fn remove(&mut self, uri: &str) -> AppResult<Movie> {
        self.detach(uri)
            .ok_or_else(|| AppError::NotFound(format!("{} is not on the unique list", uri)))
    }

    /// Removes the listed entry with the same URI as `movie`.
    ///
    /// The stored record is unwound, not the one passed in.
    pub fn remove_movie(&mut self, movie: &Movie) -> AppResult<Movie> {
        self.remove(&movie.uri)
    }

    fn insert_unchecked(&mut self, movie: Movie) {
        for (role, contributor) in movie.contributors() {
            self.index_mut(role)
                .insert(contributor.to_string(), movie.uri.clone());
        }
        self.order.push(movie.uri.clone());
        self.entries.insert(movie.uri.clone(), movie);
    }

    fn detach(&mut self, uri: &str) -> Option<Movie> {
        let movie = self.entries.remove(uri)?;
        self.order.retain(|listed| listed != uri);

        for (role, contributor) in movie.contributors() {
            let index = self.index_mut(role);
            if index.get(contributor).map(String::as_str) == Some(uri) {
                index.remove(contributor);
            }
        }

        Some(movie)
    }

    pub fn has_movie(&self, uri: &str) -> bool {
        self.entries.contains_key(uri)
    }

    pub fn get(&self, uri: &str) -> Option<&Movie> {
        self.entries.get(uri)
    }

    /// Listed movies in insertion order
    pub fn movies(&self) -> impl Iterator<Item = &Movie> + '_ {
        self.order.iter().filter_map(|uri| self.entries.get(uri))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only view of one contributor index: contributor URI → movie URI
    pub fn index_snapshot(&self, role: Role) -> &HashMap<String, String> {
        self.index(role)
    }

    /// The listed movie crediting `contributor` in `role`, if any
    pub fn movie_for_contributor(&self, role: Role, contributor: &str) -> Option<&Movie> {
        self.index(role)
            .get(contributor)
            .and_then(|uri| self.entries.get(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fargo() -> Movie {
        Movie::new("m/Fargo", "Fargo")
            .with_directors(["Coens"])
            .with_writers(["Coens"])
            .with_actors(["Buscemi", "McDormand"])
    }

    fn fargo2() -> Movie {
        Movie::new("m/Fargo2", "Fargo 2")
            .with_directors(["Coens"])
            .with_actors(["X"])
    }

    fn heat() -> Movie {
        Movie::new("m/Heat", "Heat")
            .with_directors(["Mann"])
            .with_writers(["Mann"])
            .with_actors(["Pacino", "De Niro"])
    }

    /// Every indexed contributor points at a listed movie that credits them,
    /// and every listed contributor is indexed
    fn assert_consistent(list: &UniqueMovieList) {
        for role in Role::ALL {
            for (contributor, uri) in list.index_snapshot(role) {
                let movie = list.get(uri).expect("index points at a missing movie");
                assert!(movie.credited(role).contains(contributor));
            }
        }
        for movie in list.movies() {
            for (role, contributor) in movie.contributors() {
                assert_eq!(
                    list.index_snapshot(role).get(contributor),
                    Some(&movie.uri)
                );
            }
        }
        assert_eq!(list.movies().count(), list.len());
    }

    #[test]
    fn test_add_to_empty_list() {
        let mut list = UniqueMovieList::new();
        assert_eq!(list.add(fargo(), false).unwrap(), AddOutcome::Inserted);
        assert!(list.has_movie("m/Fargo"));
        assert_eq!(
            list.index_snapshot(Role::Director).get("Coens"),
            Some(&"m/Fargo".to_string())
        );
        assert_consistent(&list);
    }

    #[test]
    fn test_can_add_is_false_for_shared_contributor() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();

        assert!(!list.can_add(&fargo2()));
        assert!(!list.can_add(&Movie::new("m/Y", "Y").with_actors(["McDormand"])));
        assert!(list.can_add(&heat()));
    }

    #[test]
    fn test_uniqueness_is_per_role() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();

        // Buscemi directing is not the same credit as Buscemi acting
        let trees_lounge = Movie::new("m/Trees_Lounge", "Trees Lounge").with_directors(["Buscemi"]);
        assert!(list.can_add(&trees_lounge));
    }

    #[test]
    fn test_add_without_force_fails_and_leaves_list_untouched() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();

        let err = list.add(fargo2(), false).unwrap_err();
        assert_eq!(
            err.conflicts(),
            &[Conflict {
                role: Role::Director,
                contributor: "Coens".to_string(),
                blocking_movie: "m/Fargo".to_string(),
            }]
        );
        assert_eq!(list.len(), 1);
        assert!(!list.has_movie("m/Fargo2"));
        assert_consistent(&list);
    }

    #[test]
    fn test_find_conflicts_reports_all_in_role_order() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();
        list.add(heat(), false).unwrap();

        let candidate = Movie::new("m/Mashup", "Mashup")
            .with_directors(["Mann", "Nobody"])
            .with_writers(["Coens"])
            .with_actors(["McDormand", "Pacino"]);

        let conflicts = list.find_conflicts(&candidate);
        let summary: Vec<(Role, &str, &str)> = conflicts
            .iter()
            .map(|c| (c.role, c.contributor.as_str(), c.blocking_movie.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Role::Director, "Mann", "m/Heat"),
                (Role::Writer, "Coens", "m/Fargo"),
                (Role::Actor, "McDormand", "m/Fargo"),
                (Role::Actor, "Pacino", "m/Heat"),
            ]
        );
    }

    #[test]
    fn test_force_replace_evicts_blockers() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();

        let outcome = list.add(fargo2(), true).unwrap();
        assert_eq!(
            outcome,
            AddOutcome::Replaced {
                evicted: vec!["m/Fargo".to_string()]
            }
        );
        assert!(!list.has_movie("m/Fargo"));
        assert!(list.has_movie("m/Fargo2"));
        assert_eq!(
            list.index_snapshot(Role::Director).get("Coens"),
            Some(&"m/Fargo2".to_string())
        );
        assert!(!list.index_snapshot(Role::Actor).contains_key("Buscemi"));
        assert!(!list.index_snapshot(Role::Actor).contains_key("McDormand"));
        assert!(!list.index_snapshot(Role::Writer).contains_key("Coens"));
        assert_consistent(&list);
    }

    #[test]
    fn test_force_replace_evicts_each_blocker_once() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();
        list.add(heat(), false).unwrap();
        list.add(Movie::new("m/Other", "Other").with_actors(["Keitel"]), false)
            .unwrap();

        let candidate = Movie::new("m/Mashup", "Mashup")
            .with_directors(["Mann"])
            .with_writers(["Coens"])
            .with_actors(["McDormand", "Pacino", "Buscemi"]);

        let blocking: Vec<String> = list
            .find_conflicts(&candidate)
            .into_iter()
            .map(|c| c.blocking_movie)
            .collect();
        assert_eq!(blocking.len(), 5);

        let outcome = list.add(candidate, true).unwrap();
        assert_eq!(
            outcome,
            AddOutcome::Replaced {
                evicted: vec!["m/Heat".to_string(), "m/Fargo".to_string()]
            }
        );
        let listed: Vec<&str> = list.movies().map(|m| m.uri.as_str()).collect();
        assert_eq!(listed, vec!["m/Other", "m/Mashup"]);
        assert_consistent(&list);
    }

    #[test]
    fn test_force_readd_identical_is_noop() {
        let mut list = UniqueMovieList::new();
        list.add(heat(), false).unwrap();
        list.add(fargo(), true).unwrap();
        let before = list.to_snapshot();

        assert_eq!(list.add(fargo(), true).unwrap(), AddOutcome::Unchanged);
        assert_eq!(list.to_snapshot(), before);
        assert_consistent(&list);
    }

    #[test]
    fn test_force_readd_with_reordered_credits_keeps_position() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();
        list.add(heat(), false).unwrap();
        let before = list.to_snapshot();

        let reordered = Movie::new("m/Fargo", "Fargo")
            .with_directors(["Coens"])
            .with_writers(["Coens"])
            .with_actors(["McDormand", "Buscemi"]);

        assert_eq!(list.add(reordered, true).unwrap(), AddOutcome::Unchanged);
        assert_eq!(list.to_snapshot(), before);
        let listed: Vec<&str> = list.movies().map(|m| m.uri.as_str()).collect();
        assert_eq!(listed, vec!["m/Fargo", "m/Heat"]);
        assert_consistent(&list);
    }

    #[test]
    fn test_force_readd_updated_record_replaces_itself() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();

        let updated = fargo().with_actors(["Buscemi", "Macy"]);
        let outcome = list.add(updated.clone(), true).unwrap();
        assert_eq!(
            outcome,
            AddOutcome::Replaced {
                evicted: vec!["m/Fargo".to_string()]
            }
        );
        assert_eq!(list.get("m/Fargo"), Some(&updated));
        assert!(!list.index_snapshot(Role::Actor).contains_key("McDormand"));
        assert_consistent(&list);
    }

    #[test]
    fn test_listed_uri_blocks_unforced_add() {
        let mut list = UniqueMovieList::new();
        list.add(Movie::new("m/Blank", "Blank"), false).unwrap();

        let err = list
            .add(Movie::new("m/Blank", "Blank").with_actors(["X"]), false)
            .unwrap_err();
        assert!(matches!(err, AppError::ConstraintViolation { .. }));
        assert!(err.conflicts().is_empty());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_unwinds_indexes() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();
        list.add(heat(), false).unwrap();

        let removed = list.remove("m/Fargo").unwrap();
        assert_eq!(removed.uri, "m/Fargo");
        assert!(list.can_add(&fargo2()));
        assert!(!list.index_snapshot(Role::Director).contains_key("Coens"));
        assert_consistent(&list);
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();

        let err = list.remove("m/Missing").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_movie_unwinds_stored_record() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();

        // A stale copy with fewer credits still unwinds everything stored
        let stale = Movie::new("m/Fargo", "Fargo");
        list.remove_movie(&stale).unwrap();
        assert!(list.index_snapshot(Role::Actor).is_empty());
        assert!(list.index_snapshot(Role::Director).is_empty());
    }

    #[test]
    fn test_unused_contributors() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();

        let candidate = Movie::new("m/Y", "Y")
            .with_directors(["Coens"])
            .with_actors(["Buscemi", "Keitel"]);
        assert_eq!(
            list.unused_contributors(&candidate),
            vec![(Role::Actor, "Keitel")]
        );
    }

    #[test]
    fn test_movie_for_contributor() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();

        let movie = list.movie_for_contributor(Role::Actor, "Buscemi").unwrap();
        assert_eq!(movie.title, "Fargo");
        assert!(list.movie_for_contributor(Role::Director, "Buscemi").is_none());
    }

    #[test]
    fn test_snapshot_round_trip_rebuilds_indexes() {
        let mut list = UniqueMovieList::new();
        list.add(fargo(), false).unwrap();
        list.add(heat(), false).unwrap();

        let restored = UniqueMovieList::from_snapshot("test", list.to_snapshot()).unwrap();
        assert_eq!(restored.to_snapshot(), list.to_snapshot());
        for role in Role::ALL {
            assert_eq!(restored.index_snapshot(role), list.index_snapshot(role));
        }
    }

    #[test]
    fn test_from_json_rejects_wrong_shape() {
        let err = UniqueMovieList::from_json("test", r#"{"movies": []}"#).unwrap_err();
        assert!(matches!(err, AppError::CorruptSnapshot { .. }));
    }

    #[test]
    fn test_conflicting_snapshot_is_corrupt() {
        let err = UniqueMovieList::from_snapshot("test", vec![fargo(), fargo2()]).unwrap_err();
        match err {
            AppError::CorruptSnapshot { list, reason } => {
                assert_eq!(list, "test");
                assert!(reason.contains("m/Fargo2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
