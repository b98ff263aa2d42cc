use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use super::rpc::RpcEnvelope;

pub(super) const MAX_FRAME_BYTES: usize = 10 * 1024 * 1024;

/// How a message arrived; replies go back the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Framing {
    ContentLength,
    JsonLine,
}

#[derive(Debug)]
pub(super) struct Frame {
    pub(super) body: String,
    pub(super) framing: Framing,
}

/// Read one message. `Ok(None)` on clean EOF.
pub(super) async fn read_frame<R>(reader: &mut BufReader<R>, max_bytes: usize) -> anyhow::Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let first = loop {
        let mut byte = [0u8; 1];
        if reader.read(&mut byte).await? == 0 {
            return Ok(None);
        }
        if !byte[0].is_ascii_whitespace() {
            break byte[0];
        }
    };

    let first_line = read_bounded_line(reader, Some(first), max_bytes).await?;
    let first_line = first_line.trim_end_matches(['\r', '\n']);

    if first == b'{' || first == b'[' {
        return Ok(Some(Frame {
            body: first_line.to_string(),
            framing: Framing::JsonLine,
        }));
    }

    let mut headers = vec![first_line.to_string()];
    loop {
        let line = read_bounded_line(reader, None, max_bytes).await?;
        if line.is_empty() {
            anyhow::bail!("unexpected EOF while reading frame headers");
        }
        let header = line.trim_end_matches(['\r', '\n']);
        if header.trim().is_empty() {
            break;
        }
        headers.push(header.to_string());
    }

    let length = content_length(&headers, max_bytes)?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    Ok(Some(Frame {
        body: String::from_utf8_lossy(&body).into_owned(),
        framing: Framing::ContentLength,
    }))
}

fn content_length(headers: &[String], max_bytes: usize) -> anyhow::Result<usize> {
    let mut length = None;
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("invalid frame header '{}'", header))?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            let parsed = value
                .trim()
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("invalid Content-Length value"))?;
            if parsed > max_bytes {
                anyhow::bail!("incoming frame too large: {} bytes (max {})", parsed, max_bytes);
            }
            length = Some(parsed);
        }
    }
    length.ok_or_else(|| anyhow::anyhow!("missing Content-Length header"))
}

/// Read up to and including `\n`, refusing lines longer than `max_bytes`.
async fn read_bounded_line<R>(
    reader: &mut BufReader<R>,
    first: Option<u8>,
    max_bytes: usize,
) -> anyhow::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = first.into_iter().collect();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            break;
        }
        let (chunk, done) = match available.iter().position(|b| *b == b'\n') {
            Some(pos) => (&available[..=pos], true),
            None => (available, false),
        };
        buf.extend_from_slice(chunk);
        let consumed = chunk.len();
        reader.consume(consumed);
        if buf.len() > max_bytes + 2 {
            anyhow::bail!("incoming frame too large: more than {} bytes", max_bytes);
        }
        if done {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub(super) async fn write_frame<W>(
    writer: &mut BufWriter<W>,
    envelope: &RpcEnvelope,
    framing: Framing,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(envelope)?;
    match framing {
        Framing::ContentLength => {
            let header = format!("Content-Length: {}\r\n\r\n", body.len());
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(&body).await?;
        }
        Framing::JsonLine => {
            writer.write_all(&body).await?;
            writer.write_all(b"\n").await?;
        }
    }
    writer.flush().await?;
    Ok(())
}
