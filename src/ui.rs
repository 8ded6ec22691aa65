use crate::config::TrackerConfig;

pub fn render_index(config: &TrackerConfig) -> String {
    let theme = &config.theme;
    INDEX_HTML
        .replace("{{TITLE_TEXT}}", &escape_html(&config.title.replace('*', "")))
        .replace("{{TITLE}}", &render_title(&config.title))
        .replace("{{SUBTITLE}}", &escape_html(&config.subtitle))
        .replace("{{ACCENT}}", &escape_html(&theme.accent))
        .replace("{{BG}}", &escape_html(&theme.background))
        .replace("{{BG_2}}", &escape_html(&theme.background_secondary))
        .replace("{{BG_3}}", &escape_html(&theme.background_tertiary))
        .replace("{{BORDER}}", &escape_html(&theme.border))
        .replace("{{TEXT}}", &escape_html(&theme.text_primary))
        .replace("{{TEXT_2}}", &escape_html(&theme.text_secondary))
        .replace("{{TEXT_MUTED}}", &escape_html(&theme.text_muted))
}

/// `*word*` segments of the title render as emphasis.
pub fn render_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len() + 16);
    let mut rest = title;
    while let Some(open) = rest.find('*') {
        let Some(len) = rest[open + 1..].find('*') else {
            break;
        };
        let inner = &rest[open + 1..open + 1 + len];
        out.push_str(&escape_html(&rest[..open]));
        if inner.is_empty() {
            out.push_str("**");
        } else {
            out.push_str("<em>");
            out.push_str(&escape_html(inner));
            out.push_str("</em>");
        }
        rest = &rest[open + len + 2..];
    }
    out.push_str(&escape_html(rest));
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE_TEXT}}</title>
  <style>
    :root {
      --accent: {{ACCENT}};
      --bg: {{BG}};
      --bg-2: {{BG_2}};
      --bg-3: {{BG_3}};
      --border: {{BORDER}};
      --text: {{TEXT}};
      --text-2: {{TEXT_2}};
      --muted: {{TEXT_MUTED}};
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--text);
      font-family: system-ui, -apple-system, sans-serif;
      padding: 40px 24px;
    }

    .app {
      max-width: 1440px;
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    header {
      display: flex;
      align-items: flex-end;
      justify-content: space-between;
      flex-wrap: wrap;
      gap: 24px;
    }

    h1 {
      font-family: Georgia, serif;
      font-weight: 400;
      font-size: clamp(32px, 5vw, 44px);
      margin: 0;
    }

    .subtitle {
      margin: 8px 0 0;
      color: var(--muted);
      font-size: 14px;
    }

    button {
      font: inherit;
      border: 1px solid var(--border);
      background: var(--bg-3);
      color: var(--text-2);
      border-radius: 8px;
      padding: 8px 14px;
      cursor: pointer;
    }

    .panel {
      background: var(--bg-2);
      border: 1px solid var(--border);
      border-radius: 14px;
      padding: 16px;
      overflow-x: auto;
    }

    table {
      border-collapse: collapse;
      font-size: 12px;
    }

    th, td {
      padding: 4px 3px;
      text-align: center;
    }

    th.track {
      text-align: left;
      min-width: 200px;
      font-weight: 500;
    }

    th.today {
      color: var(--accent);
    }

    .cell {
      min-width: 38px;
      height: 30px;
      border-radius: 6px;
      border: none;
      padding: 0;
      background: var(--bg-3);
      color: var(--text);
      position: relative;
    }

    .cell:disabled {
      opacity: 0.25;
      cursor: default;
    }

    .cell.has-note::after {
      content: "";
      position: absolute;
      top: 2px;
      right: 2px;
      width: 6px;
      height: 6px;
      border-radius: 50%;
      background: var(--accent);
    }

    .cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 10px;
    }

    .card .value {
      font-size: 24px;
      font-weight: 600;
    }

    .card .label {
      color: var(--muted);
      font-size: 12px;
    }

    .debt {
      color: var(--accent);
    }

    #chart {
      width: 100%;
      height: 220px;
      display: block;
    }

    .status {
      min-height: 1.2em;
      color: var(--text-2);
      font-size: 13px;
    }

    .login[hidden] {
      display: none;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <div>
        <h1>{{TITLE}}</h1>
        <p class="subtitle">{{SUBTITLE}}</p>
      </div>
      <div>
        <form class="login" id="login-form" hidden>
          <input id="password" type="password" placeholder="Password" autocomplete="current-password" />
          <button type="submit">Edit</button>
        </form>
        <button id="logout-btn" type="button" hidden>Lock</button>
      </div>
    </header>

    <section class="panel">
      <table id="grid"></table>
    </section>

    <section class="cards" id="cards"></section>

    <section class="panel">
      <svg id="chart" viewBox="0 0 600 220" role="img" aria-label="Cumulative hours"></svg>
    </section>

    <div class="status" id="status"></div>
  </main>

  <script>
    const gridEl = document.getElementById('grid');
    const cardsEl = document.getElementById('cards');
    const chartEl = document.getElementById('chart');
    const statusEl = document.getElementById('status');
    const loginForm = document.getElementById('login-form');
    const logoutBtn = document.getElementById('logout-btn');

    let config = null;
    let data = { hours: {}, notes: {}, highlights: {}, misc: {} };
    let stats = null;
    let editing = false;

    const setStatus = (message) => {
      statusEl.textContent = message || '';
    };

    const el = (tag, props = {}, children = []) => {
      const node = document.createElement(tag);
      Object.assign(node, props);
      children.forEach((child) => node.append(child));
      return node;
    };

    const days = () => {
      const out = [];
      const end = new Date(config.end_date + 'T00:00:00');
      for (let d = new Date(config.start_date + 'T00:00:00'); d <= end; d.setDate(d.getDate() + 1)) {
        out.push(d.getDate());
      }
      return out;
    };

    const isActive = (track, day) => {
      if (track.hours_per_day <= 0) return false;
      if (track.start_day && day < track.start_day) return false;
      if (track.start_day && track.duration && day >= track.start_day + track.duration) return false;
      return true;
    };

    const sendIntent = async (intent) => {
      setStatus('Saving...');
      const res = await fetch('/api/intent', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(intent)
      });
      if (!res.ok) {
        const body = await res.json().catch(() => ({}));
        throw new Error(body.error || 'Save failed');
      }
      stats = await res.json();
      await loadData();
      render();
      setStatus('');
    };

    const act = (intent) => sendIntent(intent).catch((err) => setStatus(err.message));

    const renderGrid = () => {
      const today = stats && stats.today ? stats.today.day : null;
      gridEl.innerHTML = '';
      const head = el('tr', {}, [el('th', { className: 'track', textContent: '' })]);
      days().forEach((day) => {
        head.append(el('th', { className: day === today ? 'today' : '', textContent: day }));
      });
      gridEl.append(head);

      config.tracks.forEach((track) => {
        const row = el('tr', {}, [
          el('th', { className: 'track', textContent: `${track.icon} ${track.name}`, title: track.notes })
        ]);
        days().forEach((day) => {
          const key = `${track.id}-${day}`;
          const logged = data.hours[key] || 0;
          const note = data.notes[key] || '';
          const active = isActive(track, day);
          const cell = el('button', {
            className: 'cell' + (note ? ' has-note' : ''),
            textContent: logged > 0 ? logged : '',
            disabled: !active,
            title: note
          });
          cell.style.background = logged > 0 ? track.color : '';
          cell.addEventListener('click', () => {
            if (editing && active) {
              act({ kind: 'increment_hours', track_id: track.id, day });
            } else if (note) {
              alert(note);
            }
          });
          cell.addEventListener('contextmenu', (event) => {
            if (!editing || !active) return;
            event.preventDefault();
            const text = prompt(`Note for ${track.name}, day ${day}`, note);
            if (text !== null) act({ kind: 'edit_note', track_id: track.id, day, text });
          });
          row.append(el('td', {}, [cell]));
        });
        gridEl.append(row);
      });

      const misc = el('tr', {}, [el('th', { className: 'track', textContent: 'Misc' })]);
      const highlights = el('tr', {}, [el('th', { className: 'track', textContent: 'Highlights' })]);
      days().forEach((day) => {
        const entry = data.misc[day] || { time: '', comment: '' };
        const miscCell = el('button', { className: 'cell' + (entry.comment ? ' has-note' : ''), textContent: entry.time, title: entry.comment });
        miscCell.addEventListener('click', () => {
          if (!editing) return;
          const time = prompt(`Misc hours for day ${day}`, entry.time);
          if (time === null) return;
          const comment = prompt('What was it?', entry.comment) || '';
          act({ kind: 'edit_misc', day, time, comment });
        });
        misc.append(el('td', {}, [miscCell]));

        const highlight = data.highlights[day] || '';
        const highlightCell = el('button', { className: 'cell' + (highlight ? ' has-note' : ''), textContent: highlight ? '*' : '', title: highlight });
        highlightCell.addEventListener('click', () => {
          if (editing) {
            const text = prompt(`Highlight for day ${day}`, highlight);
            if (text !== null) act({ kind: 'edit_highlight', day, text });
          } else if (highlight) {
            alert(highlight);
          }
        });
        highlights.append(el('td', {}, [highlightCell]));
      });
      gridEl.append(misc, highlights);
    };

    const card = (label, value) =>
      el('div', { className: 'panel card' }, [
        el('div', { className: 'value', textContent: value }),
        el('div', { className: 'label', textContent: label })
      ]);

    const renderCards = () => {
      cardsEl.innerHTML = '';
      if (!stats) return;
      if (config.features.show_total_progress) {
        cardsEl.append(card(`Total ${stats.totals.total_logged}h / ${stats.totals.total_target}h`, `${stats.totals.percentage}%`));
      }
      if (stats.today) {
        cardsEl.append(card(`Today ${stats.today.logged}h / ${stats.today.target}h`, `${stats.today.percentage}%`));
      }
      if (stats.avoidance_debt) {
        const debt = card('Avoidance debt', `${stats.avoidance_debt.toFixed(1)}h`);
        debt.classList.add('debt');
        cardsEl.append(debt);
      }
      if (config.features.show_summary_cards) {
        stats.tracks.forEach((track) => {
          cardsEl.append(card(`${track.name}: ${track.total_logged}h / ${track.total_target}h`, `${track.percentage}%`));
        });
      }
    };

    const renderChart = () => {
      if (!stats || !stats.cumulative.length) {
        chartEl.innerHTML = '';
        return;
      }
      const width = 600;
      const height = 220;
      const pad = 30;
      const points = stats.cumulative;
      const max = Math.max(1, ...points.map((p) => Math.max(p.ideal, p.actual)));
      const x = (i) => pad + (points.length > 1 ? (i * (width - pad * 2)) / (points.length - 1) : 0);
      const y = (v) => height - pad - (v / max) * (height - pad * 2);
      const line = (field) => points.map((p, i) => `${i === 0 ? 'M' : 'L'} ${x(i).toFixed(1)} ${y(p[field]).toFixed(1)}`).join(' ');
      chartEl.innerHTML = `
        <path d="${line('ideal')}" fill="none" stroke="var(--muted)" stroke-width="2" />
        <path d="${line('ideal_80')}" fill="none" stroke="var(--muted)" stroke-dasharray="4 6" stroke-width="1.5" />
        <path d="${line('actual')}" fill="none" stroke="var(--accent)" stroke-width="3" />
      `;
    };

    const render = () => {
      renderGrid();
      renderCards();
      renderChart();
      loginForm.hidden = editing;
      logoutBtn.hidden = !editing;
    };

    const loadData = async () => {
      const res = await fetch('/api/data');
      data = Object.assign({ hours: {}, notes: {}, highlights: {}, misc: {} }, await res.json());
    };

    const loadStats = async () => {
      const res = await fetch('/api/stats');
      stats = await res.json();
    };

    const init = async () => {
      const [configRes, authRes] = await Promise.all([fetch('/api/config'), fetch('/api/auth/check')]);
      config = await configRes.json();
      editing = (await authRes.json()).authenticated;
      await Promise.all([loadData(), loadStats()]);
      render();
    };

    loginForm.addEventListener('submit', async (event) => {
      event.preventDefault();
      const password = document.getElementById('password').value;
      const res = await fetch('/api/auth', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ password })
      });
      const body = await res.json().catch(() => ({}));
      if (body.success) {
        editing = true;
        document.getElementById('password').value = '';
        setStatus('');
        render();
      } else {
        setStatus(body.error || 'Login failed');
      }
    });

    logoutBtn.addEventListener('click', async () => {
      await fetch('/api/auth/logout', { method: 'POST' });
      editing = false;
      render();
    });

    init().catch((err) => setStatus(err.message));
  </script>
</body>
</html>
"#;
