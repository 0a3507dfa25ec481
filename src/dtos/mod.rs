pub mod lifecycledtos;
