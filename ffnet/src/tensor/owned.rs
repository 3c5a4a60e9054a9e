use crate::tensor::dims::{Dim1, Dim2, Dims};
use num_traits::Zero;
use rand::distributions::Distribution;
use rand::Rng;
use std::iter::zip;
use std::ops::{Index, IndexMut};
use std::slice::{ChunksExact, ChunksExactMut, Iter, IterMut};
use std::vec::IntoIter;

/// Owned, row-major tensor.
#[derive(PartialEq)]
pub struct Tensor<T, D>
where
    D: Dims,
{
    data: Vec<T>,
    dims: D,
}

pub type Tensor1<T> = Tensor<T, Dim1>;
pub type Tensor2<T> = Tensor<T, Dim2>;

impl<T, D: Dims> Tensor<T, D> {
    pub fn from_vec(data: Vec<T>, dims: D) -> Self {
        assert_eq!(
            data.len(),
            dims.tensor_len(),
            "Mismatched data length {} and dimension {}",
            data.len(),
            dims
        );
        Tensor { data, dims }
    }

    pub fn from_distribution<R, S>(rng: &mut R, dist: S, dims: D) -> Self
    where
        R: Rng,
        S: Distribution<T>,
    {
        let data: Vec<T> = dist.sample_iter(rng).take(dims.tensor_len()).collect();
        Tensor { data, dims }
    }

    #[inline]
    pub fn dims(&self) -> &D {
        &self.dims
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        self.data.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        self.data.iter_mut()
    }

    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Applies `f` elementwise, keeping the dimensions.
    pub fn map<U, F>(&self, f: F) -> Tensor<U, D>
    where
        F: FnMut(&T) -> U,
    {
        Tensor {
            data: self.data.iter().map(f).collect(),
            dims: self.dims,
        }
    }

    /// Combines two tensors of identical dimensions elementwise.
    pub fn zip_map<U, V, F>(&self, other: &Tensor<U, D>, mut f: F) -> Tensor<V, D>
    where
        F: FnMut(&T, &U) -> V,
    {
        assert_eq!(self.dims, other.dims, "Mismatched dimensions for zip_map");
        Tensor {
            data: zip(&self.data, &other.data).map(|(a, b)| f(a, b)).collect(),
            dims: self.dims,
        }
    }
}

impl<T> Tensor1<T> {
    pub fn from_vec_1d(data: Vec<T>) -> Self {
        let len = data.len();
        Tensor { data, dims: Dim1(len) }
    }
}

impl<T> Tensor2<T> {
    pub fn from_vec_2d<const N: usize>(vec: Vec<[T; N]>) -> Self {
        let rows = vec.len();
        let data: Vec<T> = vec.into_iter().flatten().collect();
        Tensor { data, dims: Dim2(rows, N) }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.dims.rows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.dims.cols()
    }

    #[inline]
    pub fn row(&self, index: usize) -> &[T] {
        let cols = self.cols();
        &self.data[index * cols..(index + 1) * cols]
    }

    #[inline]
    pub fn iter_rows(&self) -> ChunksExact<'_, T> {
        self.data.chunks_exact(self.cols().max(1))
    }

    #[inline]
    pub fn iter_rows_mut(&mut self) -> ChunksExactMut<'_, T> {
        let cols = self.cols().max(1);
        self.data.chunks_exact_mut(cols)
    }

    /// Copies the given rows, in order, into a new tensor.
    pub fn select_rows(&self, indices: &[usize]) -> Self
    where
        T: Clone,
    {
        let mut data = Vec::with_capacity(indices.len() * self.cols());
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Tensor {
            data,
            dims: Dim2(indices.len(), self.cols()),
        }
    }

    /// Copies the row range `start..end` into a new tensor.
    pub fn slice_rows(&self, start: usize, end: usize) -> Self
    where
        T: Clone,
    {
        let cols = self.cols();
        Tensor {
            data: self.data[start * cols..end * cols].to_vec(),
            dims: Dim2(end - start, cols),
        }
    }
}

impl<T: Clone, D: Dims> Tensor<T, D> {
    pub fn filled(value: T, dims: D) -> Self {
        Tensor {
            data: vec![value; dims.tensor_len()],
            dims,
        }
    }
    #[inline]
    pub fn fill(&mut self, fill: T) {
        self.data.fill(fill);
    }
}

impl<T: Zero + Clone, D: Dims> Tensor<T, D> {
    #[inline]
    pub fn zeroed(dims: D) -> Self {
        Self::filled(T::zero(), dims)
    }
}

impl<T, D: Dims> AsRef<[T]> for Tensor<T, D> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        &self.data
    }
}

impl<T, D: Dims> AsMut<[T]> for Tensor<T, D> {
    #[inline]
    fn as_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T, D: Dims> Index<usize> for Tensor<T, D> {
    type Output = T;
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<T, D: Dims> IndexMut<usize> for Tensor<T, D> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T> Index<[usize; 2]> for Tensor2<T> {
    type Output = T;
    #[inline]
    fn index(&self, [row, col]: [usize; 2]) -> &Self::Output {
        debug_assert!(row < self.rows() && col < self.cols());
        &self.data[row * self.cols() + col]
    }
}

impl<T> IndexMut<[usize; 2]> for Tensor2<T> {
    #[inline]
    fn index_mut(&mut self, [row, col]: [usize; 2]) -> &mut Self::Output {
        debug_assert!(row < self.rows() && col < self.cols());
        let cols = self.cols();
        &mut self.data[row * cols + col]
    }
}

impl<'a, T, D: Dims> IntoIterator for &'a Tensor<T, D> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<'a, T, D: Dims> IntoIterator for &'a mut Tensor<T, D> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.data.iter_mut()
    }
}

impl<T, D: Dims> IntoIterator for Tensor<T, D> {
    type Item = T;
    type IntoIter = IntoIter<T>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<T: Clone, D: Dims> Clone for Tensor<T, D> {
    fn clone(&self) -> Self {
        Tensor {
            data: self.data.clone(),
            dims: self.dims,
        }
    }
}

#[macro_export]
macro_rules! tensor {
    ($([$($x:expr),* $(,)*]),+ $(,)*) => {
        $crate::tensor::Tensor2::from_vec_2d(vec![$([$($x,)*],)*])
    };
    ($($x:expr),* $(,)*) => {
        $crate::tensor::Tensor1::from_vec_1d(vec![$($x,)*])
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_vec_2d() {
        let t: Tensor2<i32> = tensor![[1, 2, 3], [4, 5, 6]];
        assert_eq!(&Dim2(2, 3), t.dims());
        assert_eq!(&[1, 2, 3, 4, 5, 6], t.as_ref());
        assert_eq!(6, t[[1, 2]]);
        assert_eq!(&[4, 5, 6], t.row(1));
    }

    #[test]
    #[should_panic]
    fn test_from_vec_mismatched_len() {
        Tensor2::from_vec(vec![1, 2, 3], Dim2(2, 2));
    }

    #[test]
    fn test_iter_rows() {
        let mut t: Tensor2<i32> = tensor![[1, 2], [3, 4], [5, 6]];
        let sums: Vec<i32> = t.iter_rows().map(|r| r.iter().sum()).collect();
        assert_eq!(vec![3, 7, 11], sums);
        for row in t.iter_rows_mut() {
            row[0] = 0;
        }
        assert_eq!(&[0, 2, 0, 4, 0, 6], t.as_ref());
    }

    #[test]
    fn test_select_and_slice_rows() {
        let t: Tensor2<i32> = tensor![[1, 2], [3, 4], [5, 6]];
        let picked = t.select_rows(&[2, 0]);
        assert_eq!(&[5, 6, 1, 2], picked.as_ref());
        assert_eq!(&Dim2(2, 2), picked.dims());
        let sliced = t.slice_rows(1, 3);
        assert_eq!(&[3, 4, 5, 6], sliced.as_ref());
    }

    #[test]
    fn test_map_zip_map() {
        let a: Tensor2<i32> = tensor![[1, 2], [3, 4]];
        let b: Tensor2<i32> = tensor![[10, 20], [30, 40]];
        assert_eq!(&[2, 4, 6, 8], a.map(|x| x * 2).as_ref());
        assert_eq!(&[11, 22, 33, 44], a.zip_map(&b, |x, y| x + y).as_ref());
    }
}
