// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Host-side owners of the interaction lists.
//!
//! A potential collects interactions by atom id, translates them into device records in
//! `prepare_for_run`, and launches its kernel on every `compute`.  Adding interactions or changing
//! coefficients discards the prepared records, so `prepare_for_run` must be called again before
//! the next `compute`.

mod dihedral_opls;
mod e3b;

pub use dihedral_opls::DihedralOplsPotential;
pub use e3b::E3bPotential;

// End of File
