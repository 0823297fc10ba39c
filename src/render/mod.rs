//! HTML documents served to visitors: the interstitial, its minimal variant
//! and the not-found guidance page.
//!
//! Every page navigates client-side; nothing here produces a 3xx.

use crate::amazon::{Asin, ProductRecord, Region};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

const SITE_NAME: &str = "Amazon";

/// Renders pages for one marketplace and affiliate tag.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    region: Region,
    partner_tag: String,
    redirect_delay_secs: u64,
}

impl PageRenderer {
    pub fn new(region: Region, partner_tag: impl Into<String>, redirect_delay_secs: u64) -> Self {
        Self { region, partner_tag: partner_tag.into(), redirect_delay_secs }
    }

    /// Affiliate-tagged product URL, e.g. `https://www.amazon.com/dp/B09P21T2GC?tag=x-20`.
    pub fn affiliate_url(&self, asin: &Asin) -> String {
        format!(
            "{}/dp/{}?tag={}",
            self.region.base_url(),
            asin,
            urlencoding::encode(&self.partner_tag)
        )
    }

    /// Full interstitial with sharing metadata and a countdown redirect.
    pub fn render(&self, record: &ProductRecord) -> String {
        let url = self.affiliate_url(&record.asin);
        let description = if record.price.is_empty() {
            format!("View {} on {}", record.title, SITE_NAME)
        } else {
            format!("{} on {}", record.price, SITE_NAME)
        };
        let price_block = if record.price.is_empty() {
            String::new()
        } else {
            format!("\n    <p class=\"price\">{}</p>", text(&record.price))
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title_text}</title>
  <link rel="canonical" href="{url_attr}">
  <meta name="description" content="{desc_attr}">
  <meta property="og:type" content="product">
  <meta property="og:site_name" content="{site}">
  <meta property="og:title" content="{title_attr}">
  <meta property="og:description" content="{desc_attr}">
  <meta property="og:image" content="{image_attr}">
  <meta property="og:url" content="{url_attr}">
  <meta name="twitter:card" content="summary_large_image">
  <meta name="twitter:title" content="{title_attr}">
  <meta name="twitter:description" content="{desc_attr}">
  <meta name="twitter:image" content="{image_attr}">
  <noscript><meta http-equiv="refresh" content="{delay};url={url_attr}"></noscript>
{style}
</head>
<body>
  <main class="card">
    <img src="{image_attr}" alt="{title_attr}">
    <h1>{title_text}</h1>{price_block}
    <p>Redirecting to {site} in <span id="countdown">{delay}</span> seconds...</p>
    <a class="button" href="{url_attr}" rel="nofollow sponsored">Continue to {site}</a>
  </main>
{script}
</body>
</html>
"#,
            title_text = text(&record.title),
            title_attr = attr(&record.title),
            desc_attr = attr(&description),
            image_attr = attr(&record.image),
            url_attr = attr(&url),
            site = SITE_NAME,
            delay = self.redirect_delay_secs,
            price_block = price_block,
            style = STYLE,
            script = self.countdown_script(&url),
        )
    }

    /// Bare redirect page used when resolution did not finish in time.
    pub fn render_minimal(&self, asin: &Asin) -> String {
        let url = self.affiliate_url(asin);
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Redirecting to {site}</title>
  <link rel="canonical" href="{url_attr}">
  <noscript><meta http-equiv="refresh" content="{delay};url={url_attr}"></noscript>
</head>
<body>
  <p>Redirecting to {site} in <span id="countdown">{delay}</span> seconds...</p>
  <p><a href="{url_attr}" rel="nofollow sponsored">Continue to {site}</a></p>
{script}
</body>
</html>
"#,
            url_attr = attr(&url),
            site = SITE_NAME,
            delay = self.redirect_delay_secs,
            script = self.countdown_script(&url),
        )
    }

    /// Guidance page for input that does not contain an ASIN.
    pub fn render_not_found(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Product not found</title>
{style}
</head>
<body>
  <main class="card">
    <h1>Product not found</h1>
    <p>No Amazon product ID (ASIN) could be found in this link.</p>
    <p>Try one of these forms:</p>
    <ul>
      <li><code>/go/B09P21T2GC</code></li>
      <li><code>/go?url=https://{domain}/dp/B09P21T2GC</code></li>
      <li><code>/go?url=https://amzn.to/468mKVM</code></li>
    </ul>
  </main>
</body>
</html>
"#,
            style = STYLE,
            domain = self.region.domain(),
        )
    }

    fn countdown_script(&self, url: &str) -> String {
        // JSON string literal, with `</` broken up so it cannot close the script tag.
        let target = serde_json::Value::from(url).to_string().replace("</", "<\\/");
        format!(
            r#"  <script>
    (function () {{
      var target = {target};
      var remaining = {delay};
      var el = document.getElementById("countdown");
      var timer = setInterval(function () {{
        remaining -= 1;
        if (el) {{ el.textContent = Math.max(remaining, 0); }}
        if (remaining <= 0) {{
          clearInterval(timer);
          window.location.href = target;
        }}
      }}, 1000);
    }})();
  </script>"#,
            target = target,
            delay = self.redirect_delay_secs,
        )
    }
}

const STYLE: &str = r#"  <style>
    body { font-family: system-ui, sans-serif; background: #f3f3f3; margin: 0; }
    .card { max-width: 480px; margin: 48px auto; padding: 24px; background: #fff;
            border-radius: 8px; text-align: center; }
    .card img { max-width: 100%; max-height: 320px; }
    .price { font-size: 1.4em; color: #b12704; }
    .button { display: inline-block; padding: 10px 20px; background: #ffd814;
              color: #0f1111; border-radius: 20px; text-decoration: none; }
  </style>"#;
