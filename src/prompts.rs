/// Annotation placed before the second image so the model reads both images
/// as two faces of one item.
pub const BACK_FACE_NOTE: &str = include_str!("../data/prompts/back_face.txt");
