use crate::dtype::DType;
use crate::tensor::{Dim1, Dim2, Tensor1, Tensor2};
use std::iter::zip;

pub trait DTypeOps: Sized {
    /// performs a generic matrix multiplication (gemm) operation: c = alpha * op(a) * op(b) + beta * c
    fn matrix_multiply(
        alpha: Self,
        a: &Tensor2<Self>,
        ta: bool,
        b: &Tensor2<Self>,
        tb: bool,
        beta: Self,
        c: &mut Tensor2<Self>,
    );
}

macro_rules! implement_dtype_ops {
    ($t: ident, $g: ident) => {
        impl DTypeOps for $t {
            fn matrix_multiply(
                alpha: Self,
                a: &Tensor2<Self>,
                ta: bool,
                b: &Tensor2<Self>,
                tb: bool,
                beta: Self,
                c: &mut Tensor2<Self>,
            ) {
                let &Dim2(a_rows, a_cols) = a.dims();
                let &Dim2(b_rows, b_cols) = b.dims();
                let c_cols = c.cols();
                let (m, k, rsa, csa) = if ta {
                    (a_cols, a_rows, 1, a_cols as isize)
                } else {
                    (a_rows, a_cols, a_cols as isize, 1)
                };
                let (n, rsb, csb) = if tb {
                    assert_eq!(b_cols, k);
                    (b_rows, 1, b_cols as isize)
                } else {
                    assert_eq!(b_rows, k);
                    (b_cols, b_cols as isize, 1)
                };
                assert_eq!(c.dims(), &Dim2(m, n));
                unsafe {
                    matrixmultiply::$g(
                        m,
                        k,
                        n,
                        alpha,
                        a.as_ref().as_ptr(),
                        rsa,
                        csa,
                        b.as_ref().as_ptr(),
                        rsb,
                        csb,
                        beta,
                        c.as_mut().as_mut_ptr(),
                        c_cols as isize,
                        1,
                    );
                }
            }
        }
    };
}

implement_dtype_ops!(f32, sgemm);
implement_dtype_ops!(f64, dgemm);

/// Allocates and returns `op(a) * op(b)`.
///
/// Callers are responsible for checking that the inner dimensions agree.
pub fn matmul<T: DType>(a: &Tensor2<T>, ta: bool, b: &Tensor2<T>, tb: bool) -> Tensor2<T> {
    let rows = if ta { a.cols() } else { a.rows() };
    let cols = if tb { b.rows() } else { b.cols() };
    let mut c = Tensor2::zeroed(Dim2(rows, cols));
    T::matrix_multiply(T::ONE, a, ta, b, tb, T::ZERO, &mut c);
    c
}

pub fn column_sum<T: DType>(a: &Tensor2<T>) -> Tensor1<T> {
    let mut sums = Tensor1::zeroed(Dim1(a.cols()));
    for row in a.iter_rows() {
        for (s, &x) in zip(sums.iter_mut(), row) {
            *s += x;
        }
    }
    sums
}

/// Adds `v` to every row of `a` in place.
pub fn add_row_assign<T: DType>(a: &mut Tensor2<T>, v: &Tensor1<T>) {
    assert_eq!(a.cols(), v.len());
    for row in a.iter_rows_mut() {
        for (x, &b) in zip(row, v) {
            *x += b;
        }
    }
}

pub fn argmax<T: PartialOrd>(a: &[T]) -> usize {
    let mut best = 0;
    for (i, x) in a.iter().enumerate().skip(1) {
        if *x > a[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod test {
    use crate::math::{add_row_assign, argmax, column_sum, matmul, DTypeOps};
    use crate::tensor;
    use crate::tensor::{Dim2, Tensor2};

    macro_rules! assert_slice_equal {
        ($a:ident, $b:expr) => {{
            let b = $b;
            let a = $a.as_ref();
            if a.len() != b.len()
                || !std::iter::zip(a, &b).all(|(&i, &j)| (i - j).abs() <= f32::EPSILON)
            {
                let mismatch: Vec<usize> = std::iter::zip(a, &b)
                    .enumerate()
                    .filter(|&(_, (&i, &j))| (i - j).abs() > f32::EPSILON)
                    .map(|(idx, _)| idx)
                    .collect();
                panic!(
                    "slices not equal: left={:?}, right={:?}, mismatched indexes={:?}",
                    a, &b, &mismatch
                );
            }
        }};
    }

    #[test]
    fn test_mat_mul() {
        let a = Tensor2::from_vec(vec![1., 2., 3., 4., 5., 6.], Dim2(2, 3));

        let b = Tensor2::from_vec(vec![7., 8., 9., 10., 11., 12.], Dim2(3, 2));

        let c = Tensor2::from_vec(vec![0.5, 1., 1., 0.25], Dim2(2, 2));

        let mut r2x2 = Tensor2::filled(0., Dim2(2, 2));
        let mut r2x3 = Tensor2::filled(0., Dim2(2, 3));
        let mut r3x2 = Tensor2::filled(0., Dim2(3, 2));
        let mut r3x3 = Tensor2::filled(0., Dim2(3, 3));

        // various combinations of A X B

        r2x2.fill(100.); // existing values should be ignored
        f32::matrix_multiply(1.0, &a, false, &b, false, 0.0, &mut r2x2);
        assert_slice_equal!(r2x2, [58., 64., 139., 154.]);

        r2x2.fill(0.);
        f32::matrix_multiply(0.5, &a, false, &b, false, 0.0, &mut r2x2);
        assert_slice_equal!(r2x2, [29., 32., 69.5, 77.]);

        r2x2.fill(1.);
        f32::matrix_multiply(1.0, &a, false, &b, false, 5.0, &mut r2x2);
        assert_slice_equal!(r2x2, [63., 69., 144., 159.]);

        r2x2.fill(1.);
        f32::matrix_multiply(0.5, &a, false, &b, false, 5.0, &mut r2x2);
        assert_slice_equal!(r2x2, [34., 37., 74.5, 82.]);

        // B X A

        r3x3.fill(100.); // existing values should be ignored
        f32::matrix_multiply(1.0, &b, false, &a, false, 0.0, &mut r3x3);
        assert_slice_equal!(r3x3, [39., 54., 69., 49., 68., 87., 59., 82., 105.]);

        // C X Bt

        r2x3.fill(100.); // existing values should be ignored
        f32::matrix_multiply(1.0, &c, false, &b, true, 0.0, &mut r2x3);
        assert_slice_equal!(r2x3, [11.5, 14.5, 17.5, 9., 11.5, 14.]);

        // At X C

        r3x2.fill(100.); // existing values should be ignored
        f32::matrix_multiply(1.0, &a, true, &c, false, 0.0, &mut r3x2);
        assert_slice_equal!(r3x2, [4.5, 2., 6., 3.25, 7.5, 4.5]);
    }

    #[test]
    fn test_matmul_alloc() {
        let a: Tensor2<f64> = tensor![[1., 2., 3.], [4., 5., 6.]];
        let b: Tensor2<f64> = tensor![[7., 8.], [9., 10.], [11., 12.]];
        let r = matmul(&a, false, &b, false);
        assert_eq!(&Dim2(2, 2), r.dims());
        assert_eq!(&[58., 64., 139., 154.], r.as_ref());
        let r = matmul(&a, true, &a, false);
        assert_eq!(&Dim2(3, 3), r.dims());
        assert_eq!(&[17., 22., 27., 22., 29., 36., 27., 36., 45.], r.as_ref());
    }

    #[test]
    fn test_column_sum_and_row_add() {
        let mut a: Tensor2<f64> = tensor![[1., 2.], [3., 4.], [5., 6.]];
        let sums = column_sum(&a);
        assert_eq!(&[9., 12.], sums.as_ref());
        add_row_assign(&mut a, &sums);
        assert_eq!(&[10., 14., 12., 16., 14., 18.], a.as_ref());
    }

    #[test]
    fn test_argmax() {
        assert_eq!(2, argmax(&[0.1, 0.2, 0.7]));
        assert_eq!(0, argmax(&[0.5, 0.5]));
        assert_eq!(0, argmax::<f32>(&[]));
    }
}
