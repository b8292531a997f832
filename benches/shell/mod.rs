pub mod editor;
pub mod tokenizer;
