use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::chromosome::{Chromosome, GENE_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("crossover selector {0} is outside 0..=6")]
pub struct CrossoverError(pub u8);

/// Crossover operators. Each one touches only a random prefix of
/// `1..=GENE_COUNT` genes; the remaining suffix is inherited untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossover {
    /// Swap every prefix gene between the children.
    #[default]
    SinglePoint,
    /// Swap each prefix gene with probability 1/2.
    BinaryChoice,
    /// Add a blended delta to parent one and subtract it from parent two.
    UnboundedResidual,
    /// As `UnboundedResidual`, then saw-tooth wrap each gene into `[-1, 1]`.
    BoundedResidual,
    /// One blended value per gene, handed to each child with its own random sign.
    AlternatingSign,
    /// One blended value per gene, copied to both children.
    WinnerTakeAll,
    /// Each child draws its own convex blend of the two parents.
    Blend,
}

impl TryFrom<u8> for Crossover {
    type Error = CrossoverError;

    fn try_from(selector: u8) -> Result<Self, Self::Error> {
        Ok(match selector {
            0 => Crossover::SinglePoint,
            1 => Crossover::BinaryChoice,
            2 => Crossover::UnboundedResidual,
            3 => Crossover::BoundedResidual,
            4 => Crossover::AlternatingSign,
            5 => Crossover::WinnerTakeAll,
            6 => Crossover::Blend,
            other => return Err(CrossoverError(other)),
        })
    }
}

impl Crossover {
    pub const ALL: [Crossover; 7] = [
        Crossover::SinglePoint,
        Crossover::BinaryChoice,
        Crossover::UnboundedResidual,
        Crossover::BoundedResidual,
        Crossover::AlternatingSign,
        Crossover::WinnerTakeAll,
        Crossover::Blend,
    ];

    /// Produce two children from copies of the parents.
    pub fn apply<R: Rng + ?Sized>(
        self,
        first: &Chromosome,
        second: &Chromosome,
        rng: &mut R,
    ) -> (Chromosome, Chromosome) {
        let mut a = *first;
        let mut b = *second;
        let prefix = rng.random_range(1..=GENE_COUNT);

        for i in 0..prefix {
            match self {
                Crossover::SinglePoint => std::mem::swap(&mut a[i], &mut b[i]),
                Crossover::BinaryChoice => {
                    if rng.random_bool(0.5) {
                        std::mem::swap(&mut a[i], &mut b[i]);
                    }
                }
                Crossover::Blend => {
                    let (pa, pb) = (first[i], second[i]);
                    a[i] = blend(pa, pb, rng);
                    b[i] = blend(pa, pb, rng);
                }
                Crossover::WinnerTakeAll => {
                    let mixed = blend(first[i], second[i], rng);
                    a[i] = mixed;
                    b[i] = mixed;
                }
                Crossover::AlternatingSign => {
                    let mixed = blend(first[i], second[i], rng);
                    a[i] = mixed * random_sign(rng);
                    b[i] = mixed * random_sign(rng);
                }
                Crossover::BoundedResidual => {
                    let delta = blend(first[i], second[i], rng) * random_sign(rng);
                    a[i] = saw_wrap(first[i] + delta);
                    b[i] = saw_wrap(second[i] - delta);
                }
                Crossover::UnboundedResidual => {
                    let delta = blend(first[i], second[i], rng) * random_sign(rng);
                    a[i] = first[i] + delta;
                    b[i] = second[i] - delta;
                }
            }
        }

        (a, b)
    }
}

fn blend<R: Rng + ?Sized>(a: f32, b: f32, rng: &mut R) -> f32 {
    let beta: f32 = rng.random();
    beta * a + (1.0 - beta) * b
}

fn random_sign<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    if rng.random_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}

/// Fold a value into `[-1, 1]` by whole-unit steps.
///
/// Closed form, so huge magnitudes whose f32 spacing exceeds one still land
/// in range.
pub fn saw_wrap(gene: f32) -> f32 {
    if !gene.is_finite() {
        return 0.0;
    }
    let folded = if gene > 1.0 {
        gene - (gene - 1.0).ceil()
    } else if gene < -1.0 {
        gene - (gene + 1.0).floor()
    } else {
        gene
    };
    folded.clamp(-1.0, 1.0)
}
