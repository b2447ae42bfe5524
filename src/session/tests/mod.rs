//! Unit tests for the annotation state machine and session store.
//!
//! These tests drive both slots through their transitions with fake
//! collaborators that record every call, so "no call issued" is checkable.

mod draw_tests;
mod point_tests;
