use contour_analytics::polygon::Ring;

/// Cycles all the point index positions forward by `n`. E.g. index 0 becomes 1, last index
/// becomes 0, etc.
pub fn cycle_start_index_forward(input: &Ring, n: usize) -> Ring {
    assert!(n > 0, "cycling forward by 0 just returns the same ring");
    assert!(
        n < input.len(),
        "cycling forward by more than the ring length is unnecessary"
    );
    Ring::from_points(
        input
            .points()
            .iter()
            .cycle()
            .skip(n)
            .take(input.len())
            .copied()
            .collect(),
    )
}

#[derive(Debug, Clone, Copy)]
pub struct ModifiedRingState {
    pub inverted_direction: bool,
    pub cycle_position: usize,
}

impl ModifiedRingState {
    pub fn new(inverted_direction: bool, cycle_position: usize) -> Self {
        Self {
            inverted_direction,
            cycle_position,
        }
    }
}

/// Every variation of a ring that describes the same loop: each start point, in both directions.
#[derive(Debug, Clone)]
pub struct ModifiedRingSet<'a> {
    pub input: &'a Ring,
    pub invert_direction: bool,
    pub cycle_index_positions: bool,
}

impl<'a> ModifiedRingSet<'a> {
    pub fn new(input: &'a Ring, invert_direction: bool, cycle_index_positions: bool) -> Self {
        Self {
            input,
            invert_direction,
            cycle_index_positions,
        }
    }

    pub fn accept_closure<F>(&self, visitor: &mut F)
    where
        F: FnMut(Ring, ModifiedRingState),
    {
        visitor(self.input.clone(), ModifiedRingState::new(false, 0));
        if self.invert_direction {
            visitor(self.input.reversed(), ModifiedRingState::new(true, 0));
        }

        if self.cycle_index_positions {
            for i in 1..self.input.len() {
                visitor(
                    cycle_start_index_forward(self.input, i),
                    ModifiedRingState::new(false, i),
                );
            }

            if self.invert_direction {
                let inverted = self.input.reversed();
                for i in 1..inverted.len() {
                    visitor(
                        cycle_start_index_forward(&inverted, i),
                        ModifiedRingState::new(true, i),
                    );
                }
            }
        }
    }
}
