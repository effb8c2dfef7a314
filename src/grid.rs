use std::ops::{Index, IndexMut};

/// Per-panel, per-slot storage.
///
/// Each row is one panel of `WIDTH` slots. The number of rows is fixed at construction.
/// For indexing operations on this grid, `(panel, slot)` addresses a single cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T, const WIDTH: usize> {
    rows: usize,
    cells: Vec<T>,
}

impl<T, const WIDTH: usize> Grid<T, WIDTH>
where
    T: Default + Clone,
{
    pub fn new(rows: usize) -> Self {
        Grid {
            rows,
            cells: vec![T::default(); WIDTH * rows],
        }
    }
}

impl<T, const WIDTH: usize> Grid<T, WIDTH> {
    /// Build a grid from complete rows.
    pub fn from_rows(rows: impl IntoIterator<Item = [T; WIDTH]>) -> Self {
        let mut cells = Vec::new();
        let mut count = 0;
        for row in rows {
            cells.extend(row);
            count += 1;
        }
        Grid { rows: count, cells }
    }

    /// Get the internal index where the desired value is stored,
    /// or `None` if it is out of bounds.
    fn idx(&self, panel: usize, slot: usize) -> Option<usize> {
        (slot < WIDTH && panel < self.rows).then_some((panel * WIDTH) + slot)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn get(&self, panel: usize, slot: usize) -> Option<&T> {
        self.idx(panel, slot).map(|idx| &self.cells[idx])
    }

    pub fn get_mut(&mut self, panel: usize, slot: usize) -> Option<&mut T> {
        self.idx(panel, slot).map(|idx| &mut self.cells[idx])
    }

    /// All slots of one panel, or an empty slice if the panel is out of bounds.
    pub fn row(&self, panel: usize) -> &[T] {
        if panel < self.rows {
            &self.cells[panel * WIDTH..(panel + 1) * WIDTH]
        } else {
            &[]
        }
    }
}

impl<T, const WIDTH: usize> Index<(usize, usize)> for Grid<T, WIDTH> {
    type Output = T;

    fn index(&self, (panel, slot): (usize, usize)) -> &Self::Output {
        self.get(panel, slot).unwrap()
    }
}

impl<T, const WIDTH: usize> IndexMut<(usize, usize)> for Grid<T, WIDTH> {
    fn index_mut(&mut self, (panel, slot): (usize, usize)) -> &mut Self::Output {
        self.get_mut(panel, slot).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_contiguous() {
        let grid = Grid::<u8, 3>::from_rows([[1, 2, 3], [4, 5, 6]]);
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.row(1), &[4, 5, 6]);
        assert_eq!(grid[(0, 2)], 3);
        assert!(grid.row(2).is_empty());
    }

    #[test]
    fn out_of_bounds_is_none() {
        let mut grid = Grid::<bool, 3>::new(4);
        assert!(grid.get(4, 0).is_none());
        assert!(grid.get(0, 3).is_none());
        grid[(3, 2)] = true;
        assert_eq!(grid.get(3, 2), Some(&true));
    }
}
