//! Geometry metadata resolution against an in-memory catalog.

mod resolver_test;
