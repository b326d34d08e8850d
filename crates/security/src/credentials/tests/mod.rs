//! Test suite for credential issuing and verification

mod authority_tests;
