pub struct AdminCreateRequest {
    pub name: String,
    pub key_hash: String,
}
