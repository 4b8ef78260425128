mod indexes;
mod points;
mod search;

pub use indexes::{create_index, delete_index, get_index, list_indexes};
pub use points::{add_vector, add_vectors_batch, remove_vector};
pub use search::top_k_search;
