// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod balance;
pub mod cashflow;
pub mod fingerprint;
pub mod ingest;
pub mod recurring;
pub mod statement;
pub mod sync;
