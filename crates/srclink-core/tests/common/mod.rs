pub mod source_tree;
