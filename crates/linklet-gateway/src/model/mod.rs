mod url;

pub use url::{
    BatchShortenRequest, BatchShortenResponse, ShortenRequest, ShortenResponse, UrlResponse,
};
