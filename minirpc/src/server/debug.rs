//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The debug page listing services, methods and call counts.

use crate::service::Service;
use std::fmt::Write;
use std::sync::Arc;

/// Renders the debug page for `services`.
pub(crate) fn render(services: &[Arc<Service>]) -> String {
    let mut page = String::from("<html>\n<body>\n<title>minirpc Services</title>\n");
    for service in services {
        let _ = write!(
            page,
            "<hr>\nService {}\n<hr>\n<table>\n\
             <th align=center>Method</th><th align=center>Calls</th>\n",
            escape(service.name())
        );
        for method in service.methods() {
            let _ = write!(
                page,
                "<tr>\n<td align=left font=fixed>{}({}, {}) error</td>\n\
                 <td align=center>{}</td>\n</tr>\n",
                escape(method.name()),
                escape(method.arg_type()),
                escape(method.reply_type()),
                method.num_calls()
            );
        }
        page.push_str("</table>\n");
    }
    page.push_str("</body>\n</html>\n");
    page
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceBuilder;

    struct Foo;

    #[test]
    fn test_render_lists_methods() {
        let service = ServiceBuilder::new("Foo", Foo)
            .method("Sum", |_: Arc<Foo>, args: Vec<i32>| async move {
                Ok::<_, String>(args.iter().sum::<i32>())
            })
            .build();

        let page = render(&[Arc::new(service)]);
        assert!(page.contains("Service Foo"));
        assert!(page.contains("Sum(alloc::vec::Vec&lt;i32&gt;, i32) error"));
        assert!(page.contains("<td align=center>0</td>"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&</a>"), "&lt;a href=&#34;x&#34;&gt;&amp;&lt;/a&gt;");
    }
}
