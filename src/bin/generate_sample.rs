use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const LABELS: [&str; 6] = [
    "related",
    "request",
    "offer",
    "aid_related",
    "medical_help",
    "water",
];

const GENRES: [&str; 3] = ["direct", "news", "social"];

const PHRASES: [&str; 8] = [
    "We need water and food in the shelter",
    "Flooding reported near the river bank",
    "Is the hurricane over or is it not over",
    "Medical supplies are running low at the clinic",
    "Roads blocked after the earthquake",
    "Looking for information about family members",
    "Volunteers can help with cleanup tomorrow",
    "Power is back in the north district",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

struct Message {
    id: i64,
    message: String,
    original: Option<String>,
    genre: &'static str,
}

/// `related` sometimes carries a 2, like the real dataset does.
fn encode_categories(rng: &mut SimpleRng) -> String {
    LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let value = match (i, rng.below(10)) {
                (0, 0) => 2,
                (_, r) if r < 3 => 1,
                _ => 0,
            };
            format!("{label}-{value}")
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let n: i64 = 200;

    let messages: Vec<Message> = (1..=n)
        .map(|id| {
            let phrase = PHRASES[rng.below(PHRASES.len() as u64) as usize];
            Message {
                id,
                message: phrase.to_string(),
                original: (rng.below(3) == 0).then(|| format!("[orig] {phrase}")),
                genre: GENRES[rng.below(GENRES.len() as u64) as usize],
            }
        })
        .collect();

    // Messages CSV, with a few exact duplicates at the end
    let mut writer = csv::Writer::from_path("sample_messages.csv")
        .context("creating sample_messages.csv")?;
    writer.write_record(["id", "message", "original", "genre"])?;
    for m in messages.iter().chain(messages.iter().take(5)) {
        writer.write_record([
            m.id.to_string().as_str(),
            m.message.as_str(),
            m.original.as_deref().unwrap_or(""),
            m.genre,
        ])?;
    }
    writer.flush()?;

    // Categories CSV; the last ids get no row, so the left join leaves them null
    let mut writer = csv::Writer::from_path("sample_categories.csv")
        .context("creating sample_categories.csv")?;
    writer.write_record(["id", "categories"])?;
    let labelled = n - 3;
    for id in 1..=labelled {
        writer.write_record([id.to_string(), encode_categories(&mut rng)])?;
    }
    writer.flush()?;

    // Same messages as Parquet
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("message", DataType::Utf8, false),
        Field::new("original", DataType::Utf8, true),
        Field::new("genre", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(messages.iter().map(|m| m.id))),
            Arc::new(StringArray::from_iter_values(
                messages.iter().map(|m| m.message.as_str()),
            )),
            Arc::new(StringArray::from(
                messages
                    .iter()
                    .map(|m| m.original.as_deref())
                    .collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from_iter_values(messages.iter().map(|m| m.genre))),
        ],
    )
    .context("building record batch")?;

    let output_path = "sample_messages.parquet";
    let file = std::fs::File::create(output_path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    println!(
        "Wrote {} messages ({} labelled) to sample_messages.csv, sample_categories.csv and {output_path}",
        n, labelled
    );
    println!(
        "Try: process-data sample_messages.csv sample_categories.csv Sample.db --drop-unlabeled"
    );
    Ok(())
}
