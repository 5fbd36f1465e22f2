pub mod schem;
