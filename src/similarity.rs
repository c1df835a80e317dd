//! Read-only recommendation model: the movie catalog and its precomputed
//! movie-to-movie similarity matrix. Loaded once at startup.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::models::SimilarityCandidate;

/// One row of the movie catalog
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub movie_id: i64,
    pub title: String,
}

#[derive(Debug)]
pub struct SimilarityModel {
    catalog: Vec<CatalogEntry>,
    matrix: Vec<Vec<f32>>,
    index_by_title: HashMap<String, usize>,
    index_by_id: HashMap<i64, usize>,
}

impl SimilarityModel {
    /// Builds the model, rejecting a matrix that is not square over the catalog
    pub fn new(catalog: Vec<CatalogEntry>, matrix: Vec<Vec<f32>>) -> anyhow::Result<Self> {
        if matrix.len() != catalog.len() {
            bail!(
                "similarity matrix has {} rows but the catalog has {} movies",
                matrix.len(),
                catalog.len()
            );
        }
        if let Some((row, values)) = matrix
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != catalog.len())
        {
            bail!(
                "similarity row {} has {} columns, expected {}",
                row,
                values.len(),
                catalog.len()
            );
        }

        // First occurrence wins for duplicate titles and ids.
        let mut index_by_title = HashMap::with_capacity(catalog.len());
        let mut index_by_id = HashMap::with_capacity(catalog.len());
        for (index, entry) in catalog.iter().enumerate() {
            index_by_title.entry(entry.title.clone()).or_insert(index);
            index_by_id.entry(entry.movie_id).or_insert(index);
        }

        Ok(Self {
            catalog,
            matrix,
            index_by_title,
            index_by_id,
        })
    }

    /// Loads the catalog and matrix from their JSON files
    pub fn load(catalog_path: impl AsRef<Path>, similarity_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let catalog_path = catalog_path.as_ref();
        let similarity_path = similarity_path.as_ref();

        let catalog: Vec<CatalogEntry> = read_json(catalog_path)
            .with_context(|| format!("loading catalog from {}", catalog_path.display()))?;
        let matrix: Vec<Vec<f32>> = read_json(similarity_path)
            .with_context(|| format!("loading similarity matrix from {}", similarity_path.display()))?;

        let model = Self::new(catalog, matrix)?;
        tracing::info!(movies = model.len(), "Similarity model loaded");
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Exact, case-sensitive title match
    pub fn lookup_index(&self, title: &str) -> Option<usize> {
        self.index_by_title.get(title).copied()
    }

    pub fn movie_id_for(&self, index: usize) -> Option<i64> {
        self.catalog.get(index).map(|entry| entry.movie_id)
    }

    pub fn title_for(&self, movie_id: i64) -> Option<&str> {
        self.index_by_id
            .get(&movie_id)
            .map(|&index| self.catalog[index].title.as_str())
    }

    /// Catalog titles in catalog order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.catalog.iter().map(|entry| entry.title.as_str())
    }

    /// The whole similarity row for `index`, best first
    ///
    /// Sorted by score descending; equal scores keep ascending index order.
    /// The query movie itself is normally first, so callers skip rank one.
    pub fn top_k_similar(&self, index: usize, k: usize) -> Vec<SimilarityCandidate> {
        let Some(row) = self.matrix.get(index) else {
            return Vec::new();
        };

        let mut ranked: Vec<(usize, f32)> = row.iter().copied().enumerate().collect();
        // Stable sort: ties stay in index order. NaN scores sink to the bottom.
        ranked.sort_by(|a, b| {
            let a = if a.1.is_nan() { f32::NEG_INFINITY } else { a.1 };
            let b = if b.1.is_nan() { f32::NEG_INFINITY } else { b.1 };
            b.total_cmp(&a)
        });

        ranked
            .into_iter()
            .take(k)
            .filter_map(|(model_index, score)| {
                Some(SimilarityCandidate {
                    model_index,
                    movie_id: self.movie_id_for(model_index)?,
                    score,
                })
            })
            .collect()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file = std::fs::File::open(path)?;
    let value = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(value)
}
