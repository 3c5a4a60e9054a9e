use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::math::argmax;
use crate::net::Net;
use crate::tensor::{Dim2, Tensor2};
use crate::train::Dataset;
use std::iter::zip;

pub trait Scorer<T: DType> {
    fn process_batch(&mut self, output: &Tensor2<T>, expected: &Tensor2<T>) -> Result<()>;
}

pub struct NoOpScorer;

impl<T: DType> Scorer<T> for NoOpScorer {
    #[inline]
    fn process_batch(&mut self, _output: &Tensor2<T>, _expected: &Tensor2<T>) -> Result<()> {
        Ok(())
    }
}

/// Confusion matrix with expected classes as rows and predicted classes as columns.
#[derive(Clone, Debug)]
pub struct MulticlassScorer {
    matrix: Tensor2<usize>,
    count: usize,
}

impl MulticlassScorer {
    pub fn new(num_classes: usize) -> Self {
        MulticlassScorer {
            matrix: Tensor2::zeroed(Dim2(num_classes, num_classes)),
            count: 0,
        }
    }

    /// A single output column is scored as a binary classifier with two classes.
    pub fn for_net<T: DType>(net: &Net<T>) -> Self {
        Self::new(net.output_size().max(2))
    }

    #[inline]
    pub fn confusion_matrix(&self) -> &Tensor2<usize> {
        &self.matrix
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn correct(&self) -> usize {
        (0..self.matrix.rows()).map(|i| self.matrix[[i, i]]).sum()
    }

    /// Fraction of rows classified correctly, zero before any batch.
    pub fn accuracy(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.correct() as f64 / self.count as f64
        }
    }

    pub fn print_report(&self) {
        let count = self.count;
        let total_correct = self.correct();
        let total_incorrect = count - total_correct;
        let rates = Tensor2::from_vec(
            self.matrix
                .iter_rows()
                .flat_map(|row| {
                    let total = row.iter().sum::<usize>().max(1) as f64;
                    row.iter().map(move |&e| e as f64 / total)
                })
                .collect(),
            *self.matrix.dims(),
        );
        let percent_incorrect = if count == 0 {
            0.0
        } else {
            (total_incorrect as f64 / count as f64) * 100.0
        };
        println!("Confusion Matrix: {rates:.3?}");
        println!("Accuracy: {:.2}", self.accuracy());
        println!("Error rate: {percent_incorrect:.2}% ({total_incorrect}/{count})");
    }
}

impl<T: DType> Scorer<T> for MulticlassScorer {
    fn process_batch(&mut self, output: &Tensor2<T>, expected: &Tensor2<T>) -> Result<()> {
        Error::check_dims("scoring", *output.dims(), *expected.dims())?;
        let num_classes = self.matrix.rows();
        let mut classified = Vec::with_capacity(output.rows());
        for (out_row, exp_row) in zip(output.iter_rows(), expected.iter_rows()) {
            let predicted = class_of(out_row);
            let actual = class_of(exp_row);
            if predicted >= num_classes || actual >= num_classes {
                return Err(Error::WidthMismatch {
                    op: "scoring",
                    expected: num_classes,
                    actual: output.cols(),
                });
            }
            classified.push((actual, predicted));
        }
        for (actual, predicted) in classified {
            self.matrix[[actual, predicted]] += 1;
        }
        self.count += output.rows();
        Ok(())
    }
}

/// Argmax of the row, or a 0.5 threshold for single-column rows.
fn class_of<T: DType>(row: &[T]) -> usize {
    match row {
        [p] => (*p >= T::from_f64(0.5)) as usize,
        _ => argmax(row),
    }
}

/// Runs `data` through `net` in batches of `batch_size` rows and feeds every
/// prediction to `scorer`.
pub fn evaluate<T, S>(net: &Net<T>, data: &Dataset<T>, batch_size: usize, scorer: &mut S) -> Result<()>
where
    T: DType,
    S: Scorer<T> + ?Sized,
{
    for batch in data.batches(batch_size) {
        let output = net.predict(batch.inputs())?;
        scorer.process_batch(&output, batch.targets())?;
    }
    Ok(())
}
