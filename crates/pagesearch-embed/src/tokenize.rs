use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Encodes one text into `(input_ids, attention_mask)`, both shaped `[1, T]`
/// with `T <= max_len`. No padding: a single sequence never needs it.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let keep = enc.get_ids().len().min(max_len.max(1));
    let ids = &enc.get_ids()[..keep];
    let mask = &enc.get_attention_mask()[..keep];
    let input_ids = Tensor::new(ids, device)?.unsqueeze(0)?;
    let attention_mask = Tensor::new(mask, device)?.unsqueeze(0)?;
    Ok((input_ids, attention_mask))
}
