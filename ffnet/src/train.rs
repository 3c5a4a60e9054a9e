use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::net::Net;
use crate::tensor::{Dim2, Tensor2};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Input rows paired with target rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset<T: DType> {
    inputs: Tensor2<T>,
    targets: Tensor2<T>,
}

impl<T: DType> Dataset<T> {
    pub fn new(inputs: Tensor2<T>, targets: Tensor2<T>) -> Result<Self> {
        if inputs.rows() != targets.rows() {
            return Err(Error::ShapeMismatch {
                op: "dataset targets",
                expected: Dim2(inputs.rows(), targets.cols()),
                actual: *targets.dims(),
            });
        }
        Ok(Dataset { inputs, targets })
    }

    #[inline]
    pub fn inputs(&self) -> &Tensor2<T> {
        &self.inputs
    }

    #[inline]
    pub fn targets(&self) -> &Tensor2<T> {
        &self.targets
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inputs.rows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn select(&self, indices: &[usize]) -> Self {
        Dataset {
            inputs: self.inputs.select_rows(indices),
            targets: self.targets.select_rows(indices),
        }
    }

    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(rng);
        self.select(&indices)
    }

    /// Shuffles the rows and holds out `ceil(len * fraction)` of them as the
    /// second dataset.
    pub fn split<R: Rng + ?Sized>(&self, fraction: f64, rng: &mut R) -> Result<(Self, Self)> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::Config(format!("split fraction {fraction} is outside [0, 1]")));
        }
        let held_out = ((self.len() as f64) * fraction).ceil() as usize;
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(rng);
        let (first, second) = indices.split_at(self.len() - held_out.min(self.len()));
        Ok((self.select(first), self.select(second)))
    }

    /// Consecutive chunks of `batch_size` rows; the last one may be shorter.
    pub fn batches(&self, batch_size: usize) -> impl Iterator<Item = Dataset<T>> + '_ {
        let len = self.len();
        (0..len).step_by(batch_size.max(1)).map(move |start| {
            let end = (start + batch_size.max(1)).min(len);
            Dataset {
                inputs: self.inputs.slice_rows(start, end),
                targets: self.targets.slice_rows(start, end),
            }
        })
    }
}

/// Encodes class labels as rows with a single `1` at the label's column.
pub fn one_hot<T: DType>(labels: &[usize], num_classes: usize) -> Result<Tensor2<T>> {
    let mut result = Tensor2::zeroed(Dim2(labels.len(), num_classes));
    for (row, &label) in labels.iter().enumerate() {
        if label >= num_classes {
            return Err(Error::StructuralInvariant(format!(
                "label {label} is out of range for {num_classes} classes"
            )));
        }
        result[[row, label]] = T::ONE;
    }
    Ok(result)
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrainParams {
    pub learn_rate: f64,
    pub batch_size: usize,
    pub max_epochs: usize,
    /// Number of trailing validation costs that must fail to decrease before
    /// training stops, at least two are always compared. Zero disables early
    /// stopping.
    pub patience: usize,
}

impl Default for TrainParams {
    fn default() -> Self {
        TrainParams {
            learn_rate: 0.1,
            batch_size: 25,
            max_epochs: 300,
            patience: 3,
        }
    }
}

impl TrainParams {
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let params: TrainParams = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.learn_rate.is_finite() || self.learn_rate <= 0.0 {
            return Err(Error::Config(format!("learn_rate must be positive, got {}", self.learn_rate)));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Cost history of one training run.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainReport<T> {
    pub minibatch_costs: Vec<T>,
    pub training_costs: Vec<T>,
    pub validation_costs: Vec<T>,
    pub epochs: usize,
    pub stopped_early: bool,
}

/// Minibatch gradient descent with early stopping on the validation cost.
#[derive(Clone, Debug, Default)]
pub struct Trainer {
    params: TrainParams,
}

impl Trainer {
    pub fn new(params: TrainParams) -> Result<Self> {
        params.validate()?;
        Ok(Trainer { params })
    }

    #[inline]
    pub fn params(&self) -> &TrainParams {
        &self.params
    }

    pub fn train<T: DType>(
        &self,
        net: &mut Net<T>,
        train: &Dataset<T>,
        validation: &Dataset<T>,
    ) -> Result<TrainReport<T>> {
        if train.is_empty() || validation.is_empty() {
            return Err(Error::Config(format!(
                "training needs non-empty datasets, got {} training and {} validation rows",
                train.len(),
                validation.len()
            )));
        }
        let learn_rate = T::from_f64(self.params.learn_rate);
        let mut report = TrainReport {
            minibatch_costs: Vec::new(),
            training_costs: Vec::new(),
            validation_costs: Vec::new(),
            epochs: 0,
            stopped_early: false,
        };

        for epoch in 0..self.params.max_epochs {
            for batch in train.batches(self.params.batch_size) {
                let trace = net.forward(batch.inputs())?;
                let cost = net.cost(&trace[net.len()], batch.targets())?;
                report.minibatch_costs.push(cost);
                let grads = net.backward(trace, batch.targets())?;
                net.apply_gradients(&grads, learn_rate)?;
            }
            let train_cost = net.cost(&net.predict(train.inputs())?, train.targets())?;
            let validation_cost = net.cost(&net.predict(validation.inputs())?, validation.targets())?;
            report.training_costs.push(train_cost);
            report.validation_costs.push(validation_cost);
            report.epochs = epoch + 1;
            debug!(epoch, train_cost = %train_cost, validation_cost = %validation_cost, "epoch finished");

            if should_stop(&report.validation_costs, self.params.patience) {
                debug!(epoch, "validation cost stopped decreasing, stopping early");
                report.stopped_early = true;
                break;
            }
        }
        Ok(report)
    }
}

/// True once more than `patience` costs exist and the trailing window of
/// `max(patience, 2)` costs never decreased. With patience 3 this is
/// `v[-1] >= v[-2] >= v[-3]`.
pub fn should_stop<T: PartialOrd>(validation_costs: &[T], patience: usize) -> bool {
    let len = validation_costs.len();
    if patience == 0 || len <= patience {
        return false;
    }
    let window = &validation_costs[len - patience.max(2)..];
    window.windows(2).all(|pair| pair[1] >= pair[0])
}
