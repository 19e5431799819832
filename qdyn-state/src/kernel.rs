//! The amplitude kernel interface used by the execution engine

use crate::comb_state::CombState;
use crate::error::Result;
use crate::seq_state::SeqState;

/// Gate set, probability query and collapse of an exact amplitude kernel
///
/// Every gate validates its qubit indices and leaves the state untouched on
/// error. Probabilities are relative to the current, possibly unnormalized,
/// state.
pub trait Kernel {
    /// Number of qubits the kernel acts on
    fn num_qubits(&self) -> usize;

    /// Decision-diagram nodes reachable from the current state
    fn node_count(&self) -> usize;

    fn x(&mut self, target: usize) -> Result<()>;
    fn y(&mut self, target: usize) -> Result<()>;
    fn z(&mut self, target: usize) -> Result<()>;
    fn h(&mut self, target: usize) -> Result<()>;
    fn s(&mut self, target: usize) -> Result<()>;
    fn sdg(&mut self, target: usize) -> Result<()>;
    fn t(&mut self, target: usize) -> Result<()>;
    fn tdg(&mut self, target: usize) -> Result<()>;
    fn x2p(&mut self, target: usize) -> Result<()>;
    fn y2p(&mut self, target: usize) -> Result<()>;
    fn cnot(&mut self, control: usize, target: usize) -> Result<()>;
    fn cz(&mut self, control: usize, target: usize) -> Result<()>;
    fn swap(&mut self, first: usize, second: usize) -> Result<()>;
    fn toffoli(&mut self, control1: usize, control2: usize, target: usize) -> Result<()>;
    fn fredkin(&mut self, control: usize, target1: usize, target2: usize) -> Result<()>;
    fn mcx(&mut self, controls: &[usize], target: usize) -> Result<()>;
    fn cwalk(&mut self, control: usize, targets: &[usize]) -> Result<()>;
    fn reset(&mut self, target: usize) -> Result<()>;

    /// Probability of `outcomes` on `targets`
    fn get_prob(&mut self, targets: &[usize], outcomes: &[bool]) -> Result<f64>;

    /// Project onto `outcomes` without renormalizing
    fn mid_measure(&mut self, targets: &[usize], outcomes: &[bool]) -> Result<()>;
}

impl Kernel for CombState {
    fn num_qubits(&self) -> usize {
        CombState::num_qubits(self)
    }

    fn node_count(&self) -> usize {
        CombState::node_count(self)
    }

    fn x(&mut self, target: usize) -> Result<()> {
        CombState::x(self, target)
    }

    fn y(&mut self, target: usize) -> Result<()> {
        CombState::y(self, target)
    }

    fn z(&mut self, target: usize) -> Result<()> {
        CombState::z(self, target)
    }

    fn h(&mut self, target: usize) -> Result<()> {
        CombState::h(self, target)
    }

    fn s(&mut self, target: usize) -> Result<()> {
        CombState::s(self, target)
    }

    fn sdg(&mut self, target: usize) -> Result<()> {
        CombState::sdg(self, target)
    }

    fn t(&mut self, target: usize) -> Result<()> {
        CombState::t(self, target)
    }

    fn tdg(&mut self, target: usize) -> Result<()> {
        CombState::tdg(self, target)
    }

    fn x2p(&mut self, target: usize) -> Result<()> {
        CombState::x2p(self, target)
    }

    fn y2p(&mut self, target: usize) -> Result<()> {
        CombState::y2p(self, target)
    }

    fn cnot(&mut self, control: usize, target: usize) -> Result<()> {
        CombState::cnot(self, control, target)
    }

    fn cz(&mut self, control: usize, target: usize) -> Result<()> {
        CombState::cz(self, control, target)
    }

    fn swap(&mut self, first: usize, second: usize) -> Result<()> {
        CombState::swap(self, first, second)
    }

    fn toffoli(&mut self, control1: usize, control2: usize, target: usize) -> Result<()> {
        CombState::toffoli(self, control1, control2, target)
    }

    fn fredkin(&mut self, control: usize, target1: usize, target2: usize) -> Result<()> {
        CombState::fredkin(self, control, target1, target2)
    }

    fn mcx(&mut self, controls: &[usize], target: usize) -> Result<()> {
        CombState::mcx(self, controls, target)
    }

    fn cwalk(&mut self, control: usize, targets: &[usize]) -> Result<()> {
        CombState::cwalk(self, control, targets)
    }

    fn reset(&mut self, target: usize) -> Result<()> {
        CombState::reset(self, target)
    }

    fn get_prob(&mut self, targets: &[usize], outcomes: &[bool]) -> Result<f64> {
        CombState::get_prob(self, targets, outcomes)
    }

    fn mid_measure(&mut self, targets: &[usize], outcomes: &[bool]) -> Result<()> {
        CombState::mid_measure(self, targets, outcomes)
    }
}

/// Gates act on the combined state of the current iteration
impl Kernel for SeqState {
    fn num_qubits(&self) -> usize {
        SeqState::num_qubits(self)
    }

    fn node_count(&self) -> usize {
        match self.combined_state() {
            Some(combined) => combined.node_count(),
            None => self.stored_state().node_count(),
        }
    }

    fn x(&mut self, target: usize) -> Result<()> {
        self.combined_mut()?.x(target)
    }

    fn y(&mut self, target: usize) -> Result<()> {
        self.combined_mut()?.y(target)
    }

    fn z(&mut self, target: usize) -> Result<()> {
        self.combined_mut()?.z(target)
    }

    fn h(&mut self, target: usize) -> Result<()> {
        self.combined_mut()?.h(target)
    }

    fn s(&mut self, target: usize) -> Result<()> {
        self.combined_mut()?.s(target)
    }

    fn sdg(&mut self, target: usize) -> Result<()> {
        self.combined_mut()?.sdg(target)
    }

    fn t(&mut self, target: usize) -> Result<()> {
        self.combined_mut()?.t(target)
    }

    fn tdg(&mut self, target: usize) -> Result<()> {
        self.combined_mut()?.tdg(target)
    }

    fn x2p(&mut self, target: usize) -> Result<()> {
        self.combined_mut()?.x2p(target)
    }

    fn y2p(&mut self, target: usize) -> Result<()> {
        self.combined_mut()?.y2p(target)
    }

    fn cnot(&mut self, control: usize, target: usize) -> Result<()> {
        self.combined_mut()?.cnot(control, target)
    }

    fn cz(&mut self, control: usize, target: usize) -> Result<()> {
        self.combined_mut()?.cz(control, target)
    }

    fn swap(&mut self, first: usize, second: usize) -> Result<()> {
        self.combined_mut()?.swap(first, second)
    }

    fn toffoli(&mut self, control1: usize, control2: usize, target: usize) -> Result<()> {
        self.combined_mut()?.toffoli(control1, control2, target)
    }

    fn fredkin(&mut self, control: usize, target1: usize, target2: usize) -> Result<()> {
        self.combined_mut()?.fredkin(control, target1, target2)
    }

    fn mcx(&mut self, controls: &[usize], target: usize) -> Result<()> {
        self.combined_mut()?.mcx(controls, target)
    }

    fn cwalk(&mut self, control: usize, targets: &[usize]) -> Result<()> {
        self.combined_mut()?.cwalk(control, targets)
    }

    fn reset(&mut self, target: usize) -> Result<()> {
        self.combined_mut()?.reset(target)
    }

    fn get_prob(&mut self, targets: &[usize], outcomes: &[bool]) -> Result<f64> {
        self.combined_mut()?.get_prob(targets, outcomes)
    }

    fn mid_measure(&mut self, targets: &[usize], outcomes: &[bool]) -> Result<()> {
        self.combined_mut()?.mid_measure(targets, outcomes)
    }
}
