pub mod sakura;
