/// Weights of the final match score. Skill fit dominates; rate can never
/// outweigh it.
pub const MATCH_WEIGHTS: Weights = Weights {
    skills: 0.60,
    experience: 0.25,
    rate: 0.15,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub skills: f64,
    pub experience: f64,
    pub rate: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.skills + self.experience + self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        assert!((MATCH_WEIGHTS.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn skills_outweigh_rate_and_experience_combined() {
        assert!(MATCH_WEIGHTS.skills > MATCH_WEIGHTS.experience + MATCH_WEIGHTS.rate);
    }
}
