use rayon::prelude::*;

use crate::image_pipeline::common::{DatasetError, Result};

/// Row/column address of a tile within its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePosition {
    pub row: usize,
    pub column: usize,
}

/// Row-major grid of per-tile values (tiles, processed tiles, or tile pairs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid<T> {
    rows: usize,
    columns: usize,
    cells: Vec<T>,
}

impl<T> TileGrid<T> {
    pub fn from_cells(rows: usize, columns: usize, cells: Vec<T>) -> Result<Self> {
        if rows == 0 || columns == 0 || cells.len() != rows * columns {
            return Err(DatasetError::DimensionMismatch(format!(
                "{} cells cannot form a {}x{} tile grid",
                cells.len(),
                rows,
                columns
            )));
        }
        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    pub fn single(cell: T) -> Self {
        Self {
            rows: 1,
            columns: 1,
            cells: vec![cell],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, position: TilePosition) -> Option<&T> {
        if position.row >= self.rows || position.column >= self.columns {
            return None;
        }
        self.cells.get(position.row * self.columns + position.column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TilePosition, &T)> {
        let columns = self.columns;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (position_of(index, columns), cell))
    }

    /// Runs `f` on every cell, consuming the grid so each input cell is freed as soon as
    /// it has been processed. With `parallel` the cells are spread over the rayon pool;
    /// results keep their grid position either way.
    pub fn try_map<U, F>(self, parallel: bool, f: F) -> Result<TileGrid<U>>
    where
        T: Send,
        U: Send,
        F: Fn(TilePosition, T) -> Result<U> + Sync + Send,
    {
        let columns = self.columns;
        let cells = if parallel {
            self.cells
                .into_par_iter()
                .enumerate()
                .map(|(index, cell)| f(position_of(index, columns), cell))
                .collect::<Result<Vec<U>>>()?
        } else {
            self.cells
                .into_iter()
                .enumerate()
                .map(|(index, cell)| f(position_of(index, columns), cell))
                .collect::<Result<Vec<U>>>()?
        };

        Ok(TileGrid {
            rows: self.rows,
            columns,
            cells,
        })
    }
}

impl<A, B> TileGrid<(A, B)> {
    /// Splits a grid of pairs into two grids with the same layout.
    pub fn unzip(self) -> (TileGrid<A>, TileGrid<B>) {
        let (left, right): (Vec<A>, Vec<B>) = self.cells.into_iter().unzip();
        (
            TileGrid {
                rows: self.rows,
                columns: self.columns,
                cells: left,
            },
            TileGrid {
                rows: self.rows,
                columns: self.columns,
                cells: right,
            },
        )
    }
}

fn position_of(index: usize, columns: usize) -> TilePosition {
    TilePosition {
        row: index / columns,
        column: index % columns,
    }
}
