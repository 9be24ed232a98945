pub mod ops_package;
pub mod ops_resolve;
pub mod ops_service;
pub mod ops_tree;
