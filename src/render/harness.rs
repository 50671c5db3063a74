//! HTML page and bootstrap scripts loaded into the hidden webview.
//!
//! The page exposes `window.mathmemo.submit(formula)` to the host. Every
//! result travels back as a JSON message through `window.ipc.postMessage`,
//! see [`PageMessage`](crate::render::host::PageMessage) for the shapes.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub const MATHJAX_V2_URL: &str =
    "file:///usr/share/javascript/mathjax/MathJax.js?delayStartupUntil=onload";
pub const MATHJAX_V3_URL: &str = "file:///usr/share/javascript/mathjax@3/es5/tex-svg-full.js";

/// Engine generation the harness is written for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MathJaxVersion {
    V2,
    #[default]
    V3,
}

impl MathJaxVersion {
    pub fn default_url(self) -> &'static str {
        match self {
            MathJaxVersion::V2 => MATHJAX_V2_URL,
            MathJaxVersion::V3 => MATHJAX_V3_URL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MathJaxVersion::V2 => "2",
            MathJaxVersion::V3 => "3",
        }
    }
}

impl fmt::Display for MathJaxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MathJaxVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2" => Ok(MathJaxVersion::V2),
            "3" => Ok(MathJaxVersion::V3),
            other => Err(format!("unsupported MathJax version '{}'", other)),
        }
    }
}

const BRIDGE_JS: &str = r#"
<script type="text/javascript">
  'use strict';
  window.mathmemoPost = function (message) {
    window.ipc.postMessage(JSON.stringify(message));
  };
  window.onerror = function (msg) {
    window.mathmemoPost({ kind: 'log', message: String(msg) });
  };
</script>
"#;

const V2_CONFIG: &str = r#"
<script type="text/x-mathjax-config">
  MathJax.Hub.Config({
    extensions: ["tex2jax.js"],
    jax: ["input/TeX", "output/SVG"],
    tex2jax: {
      inlineMath: [['$', '$'], ["\\(", "\\)"]],
      displayMath: [['$$', '$$'], ["\\[", "\\]"]],
      processEscapes: true
    },
    TeX: {
      extensions: ["AMSmath.js", "AMSsymbols.js", "noErrors.js", "noUndefined.js"],
      Macros: %MACROS%
    },
    SVG: { useGlobalCache: false }
  });
  MathJax.Hub.Register.StartupHook("End", function () {
    window.mathmemoPost({ kind: 'ready' });
  });
</script>
"#;

const V2_SCRIPTS: &str = r#"
<script type="text/javascript">
  'use strict';
  window.mathmemo = {
    submit: function (formula) {
      var jax = MathJax.Hub.getAllJax("mathjax-container")[0];
      if (!jax) {
        window.mathmemoPost({ kind: 'failed', formula: formula, message: 'math container not ready' });
        return;
      }
      MathJax.Hub.Queue(["Text", jax, formula], function () {
        var container = document.getElementById("mathjax-container");
        var svg = container.getElementsByTagName("svg")[0];
        if (svg) {
          window.mathmemoPost({ kind: 'rendered', formula: formula, markup: svg.outerHTML });
        } else {
          window.mathmemoPost({ kind: 'failed', formula: formula, message: 'no svg produced' });
        }
      });
    }
  };
</script>
"#;

const V3_CONFIG: &str = r#"
<script type="text/javascript">
  window.MathJax = {
    options: { enableMenu: false },
    loader: { load: ['[tex]/noerrors', '[tex]/noundefined', '[tex]/mathtools'] },
    tex: {
      packages: { '[+]': ['noerrors', 'ams', 'noundefined', 'mathtools'] },
      macros: %MACROS%
    },
    svg: { fontCache: 'none' },
    startup: {
      ready: () => {
        MathJax.startup.defaultReady();
        MathJax.startup.promise.then(() => window.mathmemoPost({ kind: 'ready' }));
      }
    }
  };
</script>
"#;

const V3_SCRIPTS: &str = r#"
<script type="text/javascript">
  'use strict';
  const XML_HEADER = '<?xml version="1.0" encoding="utf-8" standalone="no"?>';
  window.mathmemo = {
    submit: function (formula) {
      MathJax.startup.promise = MathJax.startup.promise
        .then(() => MathJax.tex2svgPromise(formula, { display: true }))
        .then((node) => {
          const svg = node.getElementsByTagName('svg')[0];
          window.mathmemoPost({ kind: 'rendered', formula: formula, markup: XML_HEADER + svg.outerHTML });
        })
        .catch((err) => {
          window.mathmemoPost({ kind: 'failed', formula: formula, message: String((err && err.message) || err) });
        });
      return MathJax.startup.promise;
    }
  };
</script>
"#;

const PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
%BRIDGE%
%CONFIG%
<script type="text/javascript" src="%URL%"></script>
</head>
<body>
<div id="rescale" style="display:inline-block">
<mathjax id="mathjax-container" style="font-size:2.3em">\[\]</mathjax>
</div>
%SCRIPTS%
</body>
</html>
"#;

/// House macros available in every formula, as `(name, body, argument count)`.
pub const MACROS: &[(&str, &str, u8)] = &[
    ("RR", r"{\bf R}", 0),
    ("Ex", r"{\operatorname {Ex}}", 0),
    ("Var", r"{\operatorname {Var}}", 0),
    ("Cov", r"{\operatorname {Cov}}", 0),
    ("T", r"{\mathsf{T}}", 0),
    ("H", r"{\mathsf{H}}", 0),
    ("range", r"{\operatorname {range}}", 0),
    ("sech", r"{\operatorname {sech}}", 0),
    ("csch", r"{\operatorname {csch}}", 0),
    ("mangle", r"{\operatorname {m}\angle}", 0),
    ("bold", r"{\bf #1}", 1),
];

/// The macro table as a JavaScript object literal.
pub fn macros_object() -> String {
    let mut map = serde_json::Map::new();
    for (name, body, args) in MACROS {
        let value = if *args == 0 {
            serde_json::Value::from(*body)
        } else {
            serde_json::json!([body, args])
        };
        map.insert((*name).to_string(), value);
    }
    serde_json::Value::Object(map).to_string()
}

/// Builds the full page for `version`, loading the engine from `url`.
pub fn page(version: MathJaxVersion, url: &str) -> String {
    let (config, scripts) = match version {
        MathJaxVersion::V2 => (V2_CONFIG, V2_SCRIPTS),
        MathJaxVersion::V3 => (V3_CONFIG, V3_SCRIPTS),
    };
    let config = config.replace("%MACROS%", &macros_object());
    PAGE.replace("%BRIDGE%", BRIDGE_JS)
        .replace("%CONFIG%", &config)
        .replace("%URL%", &html_attribute(url))
        .replace("%SCRIPTS%", scripts)
}

/// Script that hands one formula to the page.
pub fn submit_script(formula: &str) -> String {
    // serde_json output is a valid JavaScript string literal.
    let quoted = serde_json::Value::from(formula).to_string();
    format!("window.mathmemo.submit({});", quoted)
}

fn html_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
