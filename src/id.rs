use rand::Rng;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const FRAGMENT_LEN: usize = 13;

fn fragment<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..FRAGMENT_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// New entity id: two independent base-36 fragments.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let mut id = fragment(&mut rng);
    id.push_str(&fragment(&mut rng));
    id
}
