//! Filter compilation through the dialect, from predicate tree to the
//! complete statement text.

mod filter_compile_test;
